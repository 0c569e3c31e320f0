use focusguard_core::platform::instructions_for;
use focusguard_core::Platform;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let platform = Platform::detect();
    println!("{} ({})", platform.display_name(), platform);
    println!("{}", instructions_for(platform).title);
    Ok(())
}
