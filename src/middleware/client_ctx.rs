use crate::db::get_db_pool;
use crate::orm::users::Role;
use crate::session::authenticate_bearer;
use crate::user::Profile;
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{error, web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Caller profile. None is an unauthenticated guest.
    pub client: Option<Profile>,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            client: None,
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    /// Resolve the caller from the `Authorization: Bearer` header, if any.
    /// A missing or invalid token yields a guest context; handlers that
    /// require identity reject it themselves.
    pub async fn from_bearer(header_value: Option<&str>) -> Self {
        let client = match header_value {
            Some(value) => authenticate_bearer(get_db_pool(), value).await,
            None => None,
        };

        ClientCtxInner {
            client,
            ..Default::default()
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            // Existing record in extensions; pull it and return clone.
            Some(cbox) => Self(cbox.clone()),
            // No existing record; create and insert it.
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.client {
            Some(user) => user.username.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.client.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    pub fn is_admin(&self) -> bool {
        matches!(&self.0.client, Some(user) if user.role == Role::Admin)
    }

    /// Require a valid bearer token. Returns the caller or ErrorUnauthorized.
    pub fn require_login(&self) -> Result<&Profile, Error> {
        self.0
            .client
            .as_ref()
            .ok_or_else(|| error::ErrorUnauthorized("Not authorized, no token"))
    }

    /// Require the admin role. The gate reports 401, not 403, for a
    /// logged-in non-admin.
    pub fn require_admin(&self) -> Result<&Profile, Error> {
        let user = self.require_login()?;
        if user.role != Role::Admin {
            return Err(error::ErrorUnauthorized("Not authorized as an administrator"));
        }
        Ok(user)
    }

    /// Check if user can modify content (owner or admin).
    pub fn can_modify(&self, resource_author_id: i32) -> bool {
        match &self.0.client {
            Some(user) => user.role == Role::Admin || user.id == resource_author_id,
            None => false,
        }
    }

    /// Require ownership of a resource (admins pass). Returns the caller
    /// or ErrorForbidden.
    pub fn require_ownership(&self, resource_author_id: i32) -> Result<&Profile, Error> {
        let user = self.require_login()?;
        if user.role != Role::Admin && user.id != resource_author_id {
            return Err(error::ErrorForbidden("You don't own this resource"));
        }
        Ok(user)
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        Box::pin(async move {
            let bearer = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let inner = ClientCtxInner::from_bearer(bearer.as_deref()).await;
            req.extensions_mut().insert(Data::new(inner));

            svc.call(req).await
        })
    }
}
