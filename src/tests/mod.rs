mod fixture;
mod malformed_tests;
