use octopus_flex_events::domain::models::Campaign;

fn main() {
    if let Err(err) = octopus_flex_events::app::run_campaign(Campaign::PowerUp) {
        eprintln!("power up finder failed: {err}");
        std::process::exit(1);
    }
}
