fn main() {
    if let Err(err) = octopus_flex_events::app::run() {
        eprintln!("campaign event finder failed: {err}");
        std::process::exit(1);
    }
}
