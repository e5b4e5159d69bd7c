// Test modules for proxy-probe
//
// Each source module has a matching test file focused on behaviour that can
// be verified without a proxy. HTTP behaviour is covered by the integration
// tests under tests/, which run against a wiremock server.
