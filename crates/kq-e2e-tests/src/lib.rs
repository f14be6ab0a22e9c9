//! End-to-end tests for kube-query live under `tests/`.
//!
//! They drive the real Axum router through `tower::ServiceExt::oneshot`
//! with stub classifiers and a seeded `MockClusterReader`.
