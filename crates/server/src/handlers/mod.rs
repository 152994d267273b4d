/// Health check route.
pub(crate) mod health;

/// Project upload, analysis and results routes.
pub(crate) mod projects;
