use super::*;
use axum::http::HeaderValue;

fn context(role: TenantRole, modules: Option<Vec<Module>>) -> TenantContext {
    TenantContext {
        user: SessionUser { id: Uuid::new_v4(), name: "Ana".into(), email: "ana@empresa.com.br".into() },
        membership: Membership { tenant_id: Uuid::new_v4(), user_id: Uuid::new_v4(), role, modules },
    }
}

#[test]
fn tenant_header_parses_uuid() {
    let id = Uuid::new_v4();
    let mut headers = HeaderMap::new();
    headers.insert(TENANT_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
    assert_eq!(tenant_id_from_headers(&headers).unwrap(), id);
}

#[test]
fn missing_or_invalid_tenant_header_is_bad_request() {
    let err = tenant_id_from_headers(&HeaderMap::new()).unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, "E_TENANT_HEADER");

    let mut headers = HeaderMap::new();
    headers.insert(TENANT_HEADER, HeaderValue::from_static("empresa-1"));
    assert_eq!(tenant_id_from_headers(&headers).unwrap_err().status, StatusCode::BAD_REQUEST);
}

#[test]
fn viewer_cannot_edit() {
    let ctx = context(TenantRole::Viewer, None);
    assert!(ctx.require(Module::Financeiro, Permission::View).is_ok());
    let err = ctx.require(Module::Financeiro, Permission::Edit).unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

#[test]
fn editor_is_limited_to_allowed_modules() {
    let ctx = context(TenantRole::Editor, Some(vec![Module::Okr]));
    assert!(ctx.require(Module::Okr, Permission::Edit).is_ok());
    assert!(ctx.require(Module::Contabil, Permission::View).is_err());
}

#[test]
fn only_owner_passes_owner_check() {
    assert!(context(TenantRole::Owner, None).require_owner().is_ok());
    assert_eq!(
        context(TenantRole::Admin, None).require_owner().unwrap_err().status,
        StatusCode::FORBIDDEN
    );
}

#[test]
fn permissions_response_lists_every_module() {
    let ctx = context(TenantRole::Viewer, Some(vec![Module::Financeiro]));
    let response = PermissionsResponse { tenant_id: ctx.tenant_id(), role: ctx.membership.role, modules: ctx.membership.flags() };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["role"], "viewer");
    assert_eq!(json["modules"].as_array().unwrap().len(), 4);
    assert_eq!(json["modules"][0]["module"], "financeiro");
    assert_eq!(json["modules"][0]["can_view"], true);
    assert_eq!(json["modules"][0]["can_edit"], false);
}
