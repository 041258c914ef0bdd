use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{HeaderName, HeaderValue},
        StatusCode,
    },
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::Level;
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

use crate::authorization::Caller;

/// 응답에 붙는 요청 ID 헤더
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 상태 코드별 로그 레벨: 5xx는 error, 4xx는 warn
fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Info
    }
}

/// 요청 로깅 미들웨어
///
/// 요청마다 ID를 발급해 `x-request-id` 헤더로 돌려주고, 완료 시 한 줄로 기록합니다.
/// 경로는 라우트 패턴(`/orders/{id}`)으로 남기며, 인증된 요청이면 사용자 ID를 덧붙입니다.
/// 쿼리 문자열과 헤더는 토큰이 섞일 수 있으므로 기록하지 않습니다.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let method = req.method().to_string();
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "<unmatched>".to_string());

        let service = self.service.clone();

        Box::pin(async move {
            // JWT/권한 단계에서 거부된 요청은 에러로 올라오므로 따로 기록
            let mut res = match service.call(req).await {
                Ok(res) => res,
                Err(e) => {
                    let status = e.as_response_error().status_code();
                    log::log!(
                        level_for(status),
                        "[{}] {} {} rejected - Status: {} ({}ms)",
                        request_id,
                        method,
                        route,
                        status.as_u16(),
                        started.elapsed().as_millis()
                    );
                    return Err(e);
                }
            };

            let user = res
                .request()
                .extensions()
                .get::<Caller>()
                .map(|caller| caller.user_id.to_string())
                .unwrap_or_else(|| "-".to_string());
            let status = res.status();

            log::log!(
                level_for(status),
                "[{}] {} {} user={} - Status: {} ({}ms)",
                request_id,
                method,
                route,
                user,
                status.as_u16(),
                started.elapsed().as_millis()
            );

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_follows_status_class() {
        assert_eq!(level_for(StatusCode::OK), Level::Info);
        assert_eq!(level_for(StatusCode::CREATED), Level::Info);
        assert_eq!(level_for(StatusCode::UNAUTHORIZED), Level::Warn);
        assert_eq!(level_for(StatusCode::FORBIDDEN), Level::Warn);
        assert_eq!(level_for(StatusCode::INTERNAL_SERVER_ERROR), Level::Error);
    }
}
