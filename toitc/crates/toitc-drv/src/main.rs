use toitc_drv::{run, Config};

fn main() {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {}", error);
            std::process::exit(2);
        }
    };
    match run(&config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {}", error);
            std::process::exit(2);
        }
    }
}
