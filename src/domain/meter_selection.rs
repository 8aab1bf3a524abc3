use std::str::FromStr;

use thiserror::Error;

use crate::domain::models::{Account, MeterDirection, MeterPoint, Property};

pub const ELECTRICITY_IMPORT_METER_TYPE: &str = "ELECTRICITY_IMPORT";

/// Which shape of the meter point schema the account query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterSchema {
    Direction,
    MeterType,
}

impl FromStr for MeterSchema {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "direction" => Ok(MeterSchema::Direction),
            "meter-type" | "meter_type" | "metertype" => Ok(MeterSchema::MeterType),
            other => Err(format!("unknown meter schema '{other}'")),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no accounts found")]
    NoAccounts,
    #[error("no properties found for account")]
    NoProperties,
    #[error("no electricity meter points found")]
    NoMeterPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    ImportWithAgreement,
    FirstAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterSelection {
    pub mpan: String,
    pub reason: SelectionReason,
}

pub fn select_account(accounts: &[Account]) -> Result<&Account, ResolveError> {
    accounts.first().ok_or(ResolveError::NoAccounts)
}

pub fn select_meter_point(
    properties: &[Property],
    schema: MeterSchema,
) -> Result<MeterSelection, ResolveError> {
    if properties.is_empty() {
        return Err(ResolveError::NoProperties);
    }

    let mut points = properties
        .iter()
        .flat_map(|property| property.meter_points.iter());

    if let Some(point) = points.clone().find(|point| is_eligible_import(point, schema)) {
        return Ok(MeterSelection {
            mpan: point.mpan.clone(),
            reason: SelectionReason::ImportWithAgreement,
        });
    }

    points
        .next()
        .map(|point| MeterSelection {
            mpan: point.mpan.clone(),
            reason: SelectionReason::FirstAvailable,
        })
        .ok_or(ResolveError::NoMeterPoints)
}

fn is_eligible_import(point: &MeterPoint, schema: MeterSchema) -> bool {
    match schema {
        MeterSchema::Direction => {
            point.direction == Some(MeterDirection::Import) && !point.agreements.is_empty()
        }
        MeterSchema::MeterType => point
            .meter_types
            .iter()
            .any(|meter_type| meter_type == ELECTRICITY_IMPORT_METER_TYPE),
    }
}
