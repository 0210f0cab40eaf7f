//! Integration tests for the harvest pipelines
//!
//! These tests use wiremock to create mock HTTP servers and run the
//! pipelines end-to-end against them.

mod pagination_tests;
mod pipeline_tests;
