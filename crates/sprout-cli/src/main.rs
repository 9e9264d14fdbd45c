use std::ffi::OsString;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    if let Err(err) = sprout_core::run(args) {
        eprintln!("sprout: {err:#}");
        std::process::exit(1);
    }
}
