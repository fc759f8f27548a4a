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

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Environment variable prefix for overriding any `ApplicationConfig` field, e.g.
/// `DPOS_NODE__ACTIVE_DELEGATES=101`.
pub const ENV_PREFIX: &str = "DPOS_NODE";

/// Loads `T` from an optional TOML file, overridden by `DPOS_NODE__`-prefixed environment
/// variables (double underscore separating nested keys), the same precedence order the
/// teacher's `config`-crate-backed application config uses.
pub fn load_settings<T: DeserializeOwned>(config_path: Option<&Path>) -> Result<T, config::ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(false));
    }
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        active_delegates: u64,
    }

    #[test]
    fn env_override_applies() {
        std::env::set_var("DPOS_NODE__ACTIVE_DELEGATES", "101");
        let loaded: Sample = load_settings(None).unwrap();
        assert_eq!(loaded.active_delegates, 101);
        std::env::remove_var("DPOS_NODE__ACTIVE_DELEGATES");
    }
}
