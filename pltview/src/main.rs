use pltview::config::load_config;
use pltview::launch::{launch, ExecReplacer};
use pltview::logging::init_logging;
use pltview::package::InstalledPackage;
use pltview::report::report_not_found;
use pltview::{resolve, InvocationContext, LauncherError, Resolution};
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
    let package = InstalledPackage::from_config(&cfg, ctx.launcher_dir());

    match resolve(&ctx, &cfg, &package) {
        Resolution::Found {
            binary, overlay, ..
        } => launch(&binary, &overlay, ctx.args(), &ExecReplacer),
        Resolution::NotFound { probed } => {
            if let Err(err) = report_not_found(&cfg.binary_name, &probed) {
                return LauncherError::Io(err);
            }
            LauncherError::NotFound { probed }
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let err = run();
    if !matches!(err, LauncherError::NotFound { .. }) {
        eprintln!("pltview: {err}");
    }
    ExitCode::from(err.exit_code())
}
