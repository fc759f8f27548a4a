// Copyright 2019. The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

/// Application entry point
use std::process;

use affinity_common::{ExitCode, ExitError};
use affinity_node::{bootstrap, cli::Cli, config::ApplicationConfig};
use clap::Parser;
use log::{error, info};

const LOG_TARGET: &str = "affinity::node::app";

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{:?}", err);
        let exit_code = err.exit_code;
        error!(target: LOG_TARGET, "Exiting with code ({}): {:?}", exit_code as i32, err);
        process::exit(exit_code as i32);
    }
}

fn main_inner() -> Result<(), ExitError> {
    let cli = Cli::parse();
    affinity_common::logging::init_logging(&cli.log_filter);

    info!(target: LOG_TARGET, "Starting node, version: {}", env!("CARGO_PKG_VERSION"));

    let config: ApplicationConfig = affinity_common::config::load_settings(cli.config.as_deref())?;

    if cli.init {
        info!(target: LOG_TARGET, "Resolved configuration: {:?}", config);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| ExitError::new(ExitCode::IoError, err))?;

    runtime.block_on(run(config))
}

async fn run(config: ApplicationConfig) -> Result<(), ExitError> {
    let ctx = bootstrap::bootstrap(&config).await?;

    info!(target: LOG_TARGET, "Node has been successfully configured and initialized.");

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| ExitError::new(ExitCode::IoError, err))?;

    info!(target: LOG_TARGET, "Shutdown signal received.");
    ctx.shutdown();

    Ok(())
}
