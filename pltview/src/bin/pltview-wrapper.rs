use pltview::config::load_config;
use pltview::launch::ExecReplacer;
use pltview::logging::init_logging;
use pltview::wrapper::{run_wrapper, which_lookup, EnvSessionProbe};
use pltview::{InvocationContext, LauncherError};
use std::process::ExitCode;

fn run() -> LauncherError {
    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(err) => return err,
    };
    let ctx = match InvocationContext::capture() {
        Ok(ctx) => ctx,
        Err(err) => return err,
    };
    let session = EnvSessionProbe::from_config(&cfg);
    run_wrapper(&ctx, &cfg, &session, &ExecReplacer, which_lookup)
}

fn main() -> ExitCode {
    init_logging();
    let err = run();
    eprintln!("pltview-wrapper: {err}");
    ExitCode::from(err.exit_code())
}
