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

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing-subscriber` registry, deriving its filter from `RUST_LOG` (falling
/// back to `default_directives` when unset) and bridging `log`'s macros — used throughout
/// `affinity_finality` and `affinity_network` against their own `LOG_TARGET` constants — into the same
/// subscriber via `tracing-log`'s compatibility layer.
///
/// Must be called exactly once, as early as possible in `main`.
pub fn init_logging(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    fmt().with_env_filter(filter).with_target(true).init();

    // tracing-subscriber's `fmt` layer only sees `tracing` events by default; installing the
    // `log` compatibility shim routes `log::info!`/`log::debug!` calls from `affinity_finality` and
    // `affinity_network` through the same subscriber rather than to stderr unfiltered.
    let _ = tracing_log::LogTracer::init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_directives_parse() {
        let filter = EnvFilter::new("info,affinity_network=debug");
        assert!(format!("{:?}", filter).contains("info"));
    }
}
