use super::{PermissionCheck, RbnsClient};
use crate::auth::authz::RequestScope;
use actix_http::body::EitherBody;
use actix_service::{Service, Transform};
use actix_web::{
    dev::{ServiceRequest, ServiceResponse},
    Error,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

pub struct ClientMiddleware<S> {
    service: Rc<S>,
    client: RbnsClient,
}

// 1. Middleware initialization
// Middleware factory is `Transform` trait from actix-service crate
// `S` - type of the next service
// `B` - type of response's body
impl<S, B> Transform<S, ServiceRequest> for RbnsClient
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = S::Error;
    type Transform = ClientMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ClientMiddleware {
            service: Rc::new(service),
            client: self.clone(),
        })
    }
}

// 2. Middleware's call method gets called with normal request.
impl<S, B> Service<ServiceRequest> for ClientMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        let source = self.client.source.clone();

        Box::pin(async move {
            match source.resolve().await {
                Ok(client) => {
                    req.set_client(client);
                    srv.call(req).await.map(|res| res.map_into_left_body())
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

pub struct PermissionCheckMiddleware<S> {
    service: Rc<S>,
    check: PermissionCheck,
}

impl<S, B> Transform<S, ServiceRequest> for PermissionCheck
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = S::Error;
    type Transform = PermissionCheckMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(PermissionCheckMiddleware {
            service: Rc::new(service),
            check: self.clone(),
        })
    }
}

impl<S, B> Service<ServiceRequest> for PermissionCheckMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        let PermissionCheck { source, check } = self.check.clone();

        Box::pin(async move {
            if let Some(source) = source {
                match source.resolve().await {
                    Ok(client) => req.set_client(client),
                    Err(err) => return Ok(req.error_response(err).map_into_right_body()),
                }
            }

            let (client, subject) = check.prepare(&req);

            match check.evaluate(client.as_ref(), subject).await.into_result() {
                Ok(()) => srv.call(req).await.map(|res| res.map_into_left_body()),
                Err(err) => {
                    log::info!("Rejecting request to {}: {err}", req.path());
                    Ok(req.error_response(err).map_into_right_body())
                }
            }
        })
    }
}
