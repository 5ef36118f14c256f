use studytimer_core::{Config, Preset};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let active = Config::load_or_default().timer.preset;
    for preset in Preset::ALL {
        let marker = if preset == active { "*" } else { " " };
        println!("{marker} {:<9} {}", preset.name(), preset.description());
    }
    Ok(())
}
