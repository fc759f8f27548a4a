// Copyright 2019, The Tari Project
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

use std::fmt;
use thiserror::Error;

/// Process exit status, mirrored onto the values `process::exit` receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    ConfigError = 101,
    IoError = 102,
    NetworkError = 103,
    FinalityError = 104,
    UnknownError = 110,
}

/// Top-level error wrapper the `node` binary's `main` surfaces. Library errors
/// (`affinity_finality::FinalityError`, `affinity_network::NetworkError`) are never propagated past the
/// binary boundary directly; they're captured here alongside the exit code they map to.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct ExitError {
    pub exit_code: ExitCode,
    pub reason: String,
}

impl ExitError {
    pub fn new(exit_code: ExitCode, reason: impl fmt::Display) -> Self {
        Self {
            exit_code,
            reason: reason.to_string(),
        }
    }
}

impl From<config::ConfigError> for ExitError {
    fn from(err: config::ConfigError) -> Self {
        ExitError::new(ExitCode::ConfigError, err)
    }
}

impl From<std::io::Error> for ExitError {
    fn from(err: std::io::Error) -> Self {
        ExitError::new(ExitCode::IoError, err)
    }
}
