mod backup;
mod cli;
mod import;
mod kubectl;
mod translate;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
