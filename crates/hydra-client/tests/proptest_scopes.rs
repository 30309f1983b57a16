//! Property-based tests for scope handling in authorization URLs.

use std::sync::Arc;

use proptest::prelude::*;

use hydra_client::config::Config;
use hydra_client::{HydraAdapter, MemorySessionStore};

fn scope_token() -> impl Strategy<Value = String> {
    // RFC 6749 scope-token characters, minus a few for readability
    "[a-zA-Z0-9_.:/-]{1,12}"
}

proptest! {
    #[test]
    fn scope_list_survives_authorization_url(scopes in prop::collection::vec(scope_token(), 1..6)) {
        let joined = scopes.join(" ");
        let config = Config::new("https://hydra.example.com", "abc123", "secret").with_scopes(&joined);
        let adapter = HydraAdapter::connect(config, Arc::new(MemorySessionStore::new())).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let url = runtime.block_on(adapter.login("sid", "https://app.example.com/callback")).unwrap();

        let scope = url
            .query_pairs()
            .find(|(k, _)| k == "scope")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        prop_assert_eq!(scope, joined);
    }
}
