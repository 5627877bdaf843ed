use devmem::{Config, DevmemRequest, StderrLogger, devmem_usage, report_error, run_devmem};
use std::process::ExitCode;
use std::{env, io};

fn main() -> ExitCode {
    let config = Config::from_env();
    if let Err(e) = StderrLogger::new(config.log_level).init() {
        eprintln!("logger: {e}");
    }
    config.log_issues();

    // args: <address> [type] [data] [count]
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "devmem".into());
    let args: Vec<String> = args.collect();

    let result = DevmemRequest::parse(&args).and_then(|request| {
        log::debug!("{request:?} via {:?}", config.backend);
        run_devmem(&config.mapper(), &request, &mut io::stdout().lock())
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report_error(&e, || devmem_usage(&program))),
    }
}
