
use errorpage::{
    http::StatusCode,
    request::attr,
    server::{handle_error_page, ErrorPage, Fault, Router},
    Attribute, BufferedResponse, DispatchKind, DispatchRequest, Failure,
};

use mock::*;

fn error_router() -> Router {
    Router::builder()
        .filter(|_req: &mut DispatchRequest, resp: &mut BufferedResponse| resp.write_str("[filtered]"))
        .named("errorHandler", "/error/500", echo_error)
        .at("/error/suspend", suspend_after_write)
        .at("/error/overflow", overflow)
        .at("/error/terminate", terminate)
        .at("/error/oom", out_of_memory)
        .at("/error/broken", broken_page)
        .build()
}

#[test]
fn test_no_page_no_failure_is_noop() {
    let router = error_router();
    let mut req = dispatch_request("/missing", "", &router);
    let mut resp = BufferedResponse::new();
    resp.set_status(StatusCode::NOT_FOUND);
    resp.write_str("my own 404").unwrap();

    handle_error_page(None, None, &mut req, &mut resp).unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(written(&resp), "my own 404");
    assert!(!resp.is_committed());
    assert_eq!(req.dispatch_kind(), DispatchKind::Request);
    assert!(req.attribute(attr::HANDLER_NAME).is_none());
    assert!(req.attribute(attr::STATUS_CODE).is_none());
}

#[test]
fn test_no_page_with_failure_leaves_response() {
    init_tracing();
    let router = error_router();
    let mut req = dispatch_request("/fail", "", &router);
    let mut resp = BufferedResponse::new();
    resp.write_str("partial").unwrap();

    let failure = Failure::new(runtime(), "boom");
    handle_error_page(None, Some(&failure), &mut req, &mut resp).unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(written(&resp), "partial");
    assert!(req.attribute(attr::FAILURE_TYPE).is_none());
}

#[test]
fn test_empty_page_path_is_noop() {
    let router = error_router();
    let mut req = dispatch_request("/fail", "", &router);
    let mut resp = BufferedResponse::new();
    resp.write_str("partial").unwrap();

    let page = ErrorPage::status(500, "").unwrap();
    handle_error_page(Some(&page), None, &mut req, &mut resp).unwrap();

    assert_eq!(written(&resp), "partial");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_missing_endpoint_writes_not_found() {
    init_tracing();
    let router = error_router();
    let mut req = dispatch_request("/fail", "", &router);
    let mut resp = BufferedResponse::new();
    resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    resp.write_str("stale output").unwrap();

    let page = ErrorPage::status(500, "error/missing").unwrap();
    handle_error_page(Some(&page), None, &mut req, &mut resp).unwrap();

    assert_eq!(written(&resp), "not found /error/missing");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_missing_endpoint_with_context_path() {
    let router = error_router();
    let mut req = dispatch_request("/app/fail", "/app", &router);
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "error/missing").unwrap();
    handle_error_page(Some(&page), None, &mut req, &mut resp).unwrap();

    assert_eq!(written(&resp), "not found /app/error/missing");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_forward_when_not_committed() {
    let router = error_router();
    let mut req = dispatch_request("/app/orders/7", "/app", &router);
    let mut resp = BufferedResponse::new();
    resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    resp.set_message("database down");
    resp.set_content_length(Some(99));
    resp.write_str("half an order page").unwrap();

    let page = ErrorPage::status(500, "/error/500").unwrap();
    let failure = Failure::new(bad_port(), "port 99999");
    handle_error_page(Some(&page), Some(&failure), &mut req, &mut resp).unwrap();

    // error page output replaces the response, without the filter's
    assert_eq!(written(&resp), "error 500 at /app/orders/7 (BadPortException)");
    assert!(resp.is_committed());
    assert_eq!(resp.content_length(), None);
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(req.dispatch_kind(), DispatchKind::Error);
    assert_eq!(req.attribute(attr::HANDLER_NAME).and_then(Attribute::as_text), Some("errorHandler"));
    assert_eq!(req.attribute(attr::REQUEST_URI).and_then(Attribute::as_text), Some("/app/orders/7"));
    assert_eq!(
        req.attribute(attr::STATUS_CODE).and_then(Attribute::as_status),
        Some(StatusCode::INTERNAL_SERVER_ERROR)
    );
    assert_eq!(req.attribute(attr::MESSAGE).and_then(Attribute::as_text), Some("database down"));
    assert_eq!(req.attribute(attr::FAILURE_TYPE).and_then(Attribute::as_text), Some("BadPortException"));
}

#[test]
fn test_absent_message_clears_attribute() {
    let router = error_router();
    let mut req = dispatch_request("/x", "", &router);
    req.set_attribute(attr::MESSAGE, "left over");
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "/error/500").unwrap();
    handle_error_page(Some(&page), None, &mut req, &mut resp).unwrap();

    assert!(req.attribute(attr::MESSAGE).is_none());
    assert!(req.attribute(attr::FAILURE_TYPE).is_none());
}

#[test]
fn test_suspend_flag_cleared_after_forward() {
    let router = error_router();
    let mut req = dispatch_request("/x", "", &router);
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "/error/suspend").unwrap();
    handle_error_page(Some(&page), None, &mut req, &mut resp).unwrap();

    assert_eq!(written(&resp), "suspended page");
    assert!(!resp.output_stream().is_suspended());
    resp.write_str(", more").unwrap();
    assert_eq!(written(&resp), "suspended page, more");
}

#[test]
fn test_include_when_committed() {
    let router = Router::builder()
        .at("/error/500", |_req: &mut DispatchRequest, resp: &mut BufferedResponse| {
            resp.set_status(StatusCode::IM_A_TEAPOT);
            resp.write_str(" [error page]")
        })
        .build();
    let mut req = dispatch_request("/stream", "", &router);
    let mut resp = BufferedResponse::new();
    resp.write_str("already sent").unwrap();
    resp.flush_buffer();

    let page = ErrorPage::status(500, "/error/500").unwrap();
    handle_error_page(Some(&page), None, &mut req, &mut resp).unwrap();

    assert_eq!(written(&resp), "already sent [error page]");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(req.dispatch_kind(), DispatchKind::Error);
}

#[test]
fn test_stack_exhaustion_is_discarded() {
    let router = error_router();
    let mut req = dispatch_request("/x", "", &router);
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "/error/overflow").unwrap();
    assert!(handle_error_page(Some(&page), None, &mut req, &mut resp).is_ok());
}

#[test]
fn test_termination_propagates() {
    init_tracing();
    let router = error_router();
    let mut req = dispatch_request("/x", "", &router);
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "/error/terminate").unwrap();
    let res = handle_error_page(Some(&page), None, &mut req, &mut resp);
    assert!(matches!(res, Err(Fault::Terminated)));
}

#[test]
fn test_platform_fault_propagates() {
    let router = error_router();
    let mut req = dispatch_request("/x", "", &router);
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "/error/oom").unwrap();
    match handle_error_page(Some(&page), None, &mut req, &mut resp) {
        Err(Fault::Platform(msg)) => assert_eq!(msg, "out of memory"),
        other => panic!("expected platform fault, got {:?}", other),
    }
}

#[test]
fn test_failing_error_page_is_contained() {
    init_tracing();
    let router = error_router();
    let mut req = dispatch_request("/x", "", &router);
    let mut resp = BufferedResponse::new();

    let page = ErrorPage::status(500, "/error/broken").unwrap();
    assert!(handle_error_page(Some(&page), None, &mut req, &mut resp).is_ok());
}
