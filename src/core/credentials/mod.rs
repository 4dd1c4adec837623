pub mod credential_service;
pub mod credentials_models;

pub use credential_service::{CredentialError, CredentialResolver, CredentialStore, TokenProvider};
pub use credentials_models::{
    AccessToken, CredentialSetup, CredentialStatus, OAuthClient, ResolvedCredentials,
    SharedCredentials, UserCredentials,
};
