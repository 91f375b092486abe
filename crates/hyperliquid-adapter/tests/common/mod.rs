/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for hyperliquid-adapter tests

use std::sync::Arc;

use hyperliquid_adapter::{
    AssetDirectory, BaseUrl, ExchangeClient, LocalWallet, StaticDirectory,
};
use wiremock::MockServer;

/// Well-known throwaway key; its address is
/// 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266.
pub const TEST_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Directory with a few perp and spot assets registered
pub fn test_directory() -> Arc<dyn AssetDirectory> {
    let mut directory = StaticDirectory::new();
    directory.insert("ETH", 3);
    directory.insert("BTC", 0);
    directory.insert_aliased("PURR/USDC", "@1", 10_001);
    Arc::new(directory)
}

/// Exchange client signing with the test key, pointed at the mock server
pub fn test_exchange_client(server: &MockServer) -> ExchangeClient {
    let wallet = Arc::new(LocalWallet::new(TEST_KEY).expect("test key is valid"));
    ExchangeClient::new(wallet, test_directory(), BaseUrl::Testnet, None)
        .expect("client construction")
        .with_endpoint(&server.uri())
        .expect("mock endpoint")
}
