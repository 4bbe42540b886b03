use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    tether::cli::main()
}
