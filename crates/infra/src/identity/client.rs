//! Azure AD v1 identity provider adapter

use async_trait::async_trait;
use azauth_core::IdentityProvider;
use azauth_domain::constants::{
    CLIENT_ASSERTION_TYPE_JWT, COMMON_TENANT, GRANT_AUTHORIZATION_CODE, GRANT_CLIENT_CREDENTIALS,
    GRANT_DEVICE_CODE, GRANT_REFRESH_TOKEN, IMDS_API_VERSION, IMDS_ENDPOINT,
};
use azauth_domain::{
    AccessToken, AuthConfig, AuthError, AzureEnvironment, ClientSecret, Credential,
    DeviceCodeInfo, Result, ServicePrincipal,
};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, trace};

use super::assertion::ClientCertificate;
use super::wire::{provider_error, DeviceCodeResponse, TokenResponse};
use crate::errors::conversions::to_auth;
use crate::http::HttpClient;

/// Talks to the Azure AD token, device code and managed identity endpoints
pub struct AzureIdentityClient {
    http: HttpClient,
    client_id: String,
    authority_host: Option<String>,
    msi_endpoint: Option<String>,
    imds_endpoint: String,
}

impl AzureIdentityClient {
    /// Create a client for the public login application.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let http = HttpClient::builder().quiet(config.quiet).build()?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: HttpClient, config: &AuthConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            authority_host: config.authority_host.clone(),
            msi_endpoint: None,
            imds_endpoint: IMDS_ENDPOINT.to_string(),
        }
    }

    /// Use the Cloud Shell managed identity endpoint instead of IMDS.
    #[must_use]
    pub fn with_msi_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.msi_endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_imds_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.imds_endpoint = endpoint.into();
        self
    }

    /// Active Directory authority for `environment`, always ending in `/`.
    fn authority(&self, environment: AzureEnvironment) -> String {
        match self.authority_host.as_deref() {
            Some(host) if host.ends_with('/') => host.to_string(),
            Some(host) => format!("{host}/"),
            None => environment.active_directory_endpoint().to_string(),
        }
    }

    fn token_endpoint(&self, environment: AzureEnvironment, tenant: &str) -> String {
        format!("{}{}/oauth2/token", self.authority(environment), tenant)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let grant = form.iter().find(|(k, _)| *k == "grant_type").map_or("none", |(_, v)| *v);
        if self.http.is_quiet() {
            trace!(url, grant, "token endpoint request");
        } else {
            debug!(url, grant, "token endpoint request");
        }

        let response = self.http.send(self.http.request(Method::POST, url).form(form)).await?;
        read_json(response).await
    }

    async fn request_token(
        &self,
        environment: AzureEnvironment,
        form: &[(&str, &str)],
    ) -> Result<Credential> {
        let url = self.token_endpoint(environment, COMMON_TENANT);
        let response: TokenResponse = self.post_form(&url, form).await?;
        response.into_credential(environment)
    }
}

/// Decode a success body or turn an error body into `AuthError::Provider`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(to_auth)?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|err| {
            AuthError::Internal(format!("unexpected identity provider response: {err}"))
        });
    }

    match provider_error(&body) {
        Some(err) => Err(AuthError::Provider(err)),
        None => Err(AuthError::Network(format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status")
        ))),
    }
}

#[async_trait]
impl IdentityProvider for AzureIdentityClient {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn authorization_endpoint(&self, environment: AzureEnvironment) -> String {
        format!("{}{}/oauth2/authorize", self.authority(environment), COMMON_TENANT)
    }

    async fn exchange_authorization_code(
        &self,
        environment: AzureEnvironment,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential> {
        self.request_token(
            environment,
            &[
                ("grant_type", GRANT_AUTHORIZATION_CODE),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("resource", environment.management_endpoint()),
            ],
        )
        .await
    }

    async fn request_device_code(&self, environment: AzureEnvironment) -> Result<DeviceCodeInfo> {
        let url = format!("{}{}/oauth2/devicecode", self.authority(environment), COMMON_TENANT);
        let response: DeviceCodeResponse = self
            .post_form(
                &url,
                &[("client_id", self.client_id.as_str()), ("resource", environment.management_endpoint())],
            )
            .await?;
        Ok(response.into())
    }

    async fn redeem_device_code(
        &self,
        environment: AzureEnvironment,
        device_code: &DeviceCodeInfo,
    ) -> Result<Credential> {
        self.request_token(
            environment,
            &[
                ("grant_type", GRANT_DEVICE_CODE),
                ("client_id", self.client_id.as_str()),
                ("code", device_code.device_code.as_str()),
                ("resource", environment.management_endpoint()),
            ],
        )
        .await
    }

    async fn refresh_token(
        &self,
        environment: AzureEnvironment,
        refresh_token: &str,
        resource: Option<&str>,
    ) -> Result<Credential> {
        self.request_token(
            environment,
            &[
                ("grant_type", GRANT_REFRESH_TOKEN),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token),
                ("resource", resource.unwrap_or(environment.management_endpoint())),
            ],
        )
        .await
    }

    async fn client_credentials(
        &self,
        principal: &ServicePrincipal,
        resource: &str,
    ) -> Result<AccessToken> {
        let url = self.token_endpoint(principal.environment, &principal.tenant_id);
        let mut form = vec![
            ("grant_type", GRANT_CLIENT_CREDENTIALS.to_string()),
            ("client_id", principal.client_id.clone()),
            ("resource", resource.to_string()),
        ];

        match &principal.secret {
            ClientSecret::Key(key) => form.push(("client_secret", key.clone())),
            ClientSecret::Certificate { path, .. } => {
                let certificate = ClientCertificate::load(path).await?;
                form.push(("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT.to_string()));
                form.push(("client_assertion", certificate.assertion(&principal.client_id, &url)?));
            }
        }

        let form: Vec<(&str, &str)> = form.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let response: TokenResponse = self.post_form(&url, &form).await?;
        info!(client_id = %principal.client_id, tenant = %principal.tenant_id, "service principal token issued");
        response.into_access_token()
    }

    async fn managed_identity_token(&self, resource: &str) -> Result<AccessToken> {
        let request = match &self.msi_endpoint {
            Some(endpoint) => self
                .http
                .request(Method::POST, endpoint)
                .header("Metadata", "true")
                .form(&[("resource", resource)]),
            None => self
                .http
                .request(Method::GET, &self.imds_endpoint)
                .header("Metadata", "true")
                .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)]),
        };

        debug!(resource, cloud_shell = self.msi_endpoint.is_some(), "managed identity token request");
        let response: TokenResponse = read_json(self.http.send(request).await?).await?;
        response.into_access_token()
    }
}
