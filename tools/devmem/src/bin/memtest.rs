use devmem::{Config, MemtestRequest, StderrLogger, memtest_usage, report_error, run_memtest};
use std::process::ExitCode;
use std::{env, io};

fn main() -> ExitCode {
    let config = Config::from_env();
    if let Err(e) = StderrLogger::new(config.log_level).init() {
        eprintln!("logger: {e}");
    }
    config.log_issues();

    // args: <address> [test_id] [data]
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "memtest".into());
    let args: Vec<String> = args.collect();

    let result = MemtestRequest::parse(&args).and_then(|request| {
        log::debug!("{request:?} via {:?}", config.backend);
        run_memtest(&config.mapper(), &request, &mut io::stdout().lock(), &mut io::stderr().lock())
    });

    match result {
        Ok(mismatches) => {
            if !mismatches.is_empty() {
                log::warn!("{} mismatches", mismatches.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(report_error(&e, || memtest_usage(&program))),
    }
}
