
// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the application:
// - smoke_tests: Basic functionality tests to ensure nothing is broken
// - appointments_mock: Mocking the booking service API for testing the
//   sync behaviour without a real server
