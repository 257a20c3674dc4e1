use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("predbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: predbridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("PREDBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "transports: pipe={}, socket=true",
        cfg!(unix)
    );
    println!(
        "default_receive_timeout_ms: {}",
        predbridge_channel::DEFAULT_RECEIVE_TIMEOUT.as_millis()
    );
    println!(
        "default_suggestions: {}",
        predbridge_session::params::DEFAULT_SUGGESTIONS
    );

    Ok(SUCCESS)
}
