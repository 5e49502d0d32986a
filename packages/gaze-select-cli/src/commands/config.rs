use crate::cli::ConfigArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: ConfigArgs) -> i32 {
    match args.selector.resolve() {
        Ok(config) => output::emit(&config, args.compact, None),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::for_error(&e)
        }
    }
}
