use super::*;

// =============================================================================
// role ladder
// =============================================================================

#[test]
fn role_satisfies_viewer_allows_view_only() {
    assert!(role_satisfies(TenantRole::Viewer, Permission::View));
    assert!(!role_satisfies(TenantRole::Viewer, Permission::Edit));
    assert!(!role_satisfies(TenantRole::Viewer, Permission::Admin));
}

#[test]
fn role_satisfies_editor_allows_view_and_edit() {
    assert!(role_satisfies(TenantRole::Editor, Permission::View));
    assert!(role_satisfies(TenantRole::Editor, Permission::Edit));
    assert!(!role_satisfies(TenantRole::Editor, Permission::Admin));
}

#[test]
fn role_satisfies_admin_and_owner_allow_all() {
    for role in [TenantRole::Admin, TenantRole::Owner] {
        assert!(role_satisfies(role, Permission::View));
        assert!(role_satisfies(role, Permission::Edit));
        assert!(role_satisfies(role, Permission::Admin));
    }
}

#[test]
fn tenant_role_roundtrip_str() {
    for role in [TenantRole::Owner, TenantRole::Admin, TenantRole::Editor, TenantRole::Viewer] {
        assert_eq!(TenantRole::from_str(role.as_str()), Some(role));
    }
    assert_eq!(TenantRole::from_str("ADMIN"), None);
    assert_eq!(TenantRole::from_str(""), None);
}

#[test]
fn module_roundtrip_str() {
    for module in Module::ALL {
        assert_eq!(Module::from_str(module.as_str()), Some(module));
    }
    assert_eq!(Module::from_str("rh"), None);
}

// =============================================================================
// module allow-list
// =============================================================================

#[test]
fn editor_restricted_to_listed_modules() {
    let modules = [Module::Financeiro];
    assert!(member_allows(TenantRole::Editor, Some(&modules), Module::Financeiro, Permission::Edit));
    assert!(!member_allows(TenantRole::Editor, Some(&modules), Module::Contabil, Permission::View));
}

#[test]
fn unrestricted_member_reaches_every_module() {
    for module in Module::ALL {
        assert!(member_allows(TenantRole::Viewer, None, module, Permission::View));
    }
}

#[test]
fn admin_ignores_module_restriction() {
    let modules = [Module::Okr];
    assert!(member_allows(TenantRole::Admin, Some(&modules), Module::Contabil, Permission::Admin));
}

#[test]
fn empty_allow_list_blocks_everything_for_editor() {
    assert!(!member_allows(TenantRole::Editor, Some(&[]), Module::Okr, Permission::View));
}

#[test]
fn membership_flags_cover_all_modules() {
    let membership = Membership {
        tenant_id: Uuid::nil(),
        user_id: Uuid::nil(),
        role: TenantRole::Editor,
        modules: Some(vec![Module::Okr]),
    };
    let flags = membership.flags();
    assert_eq!(flags.len(), Module::ALL.len());
    let okr = flags.iter().find(|f| f.module == Module::Okr).unwrap();
    assert!(okr.can_view && okr.can_edit && !okr.can_admin);
    let contabil = flags.iter().find(|f| f.module == Module::Contabil).unwrap();
    assert!(!contabil.can_view && !contabil.can_edit && !contabil.can_admin);
}

#[test]
fn module_flags_serialize_lowercase() {
    let flags = ModuleFlags { module: Module::Financeiro, can_view: true, can_edit: false, can_admin: false };
    let json = serde_json::to_value(flags).unwrap();
    assert_eq!(json["module"], "financeiro");
}

// =============================================================================
// input parsing
// =============================================================================

#[test]
fn parse_role_rejects_owner_and_unknown() {
    assert!(parse_role_and_modules("owner", None).is_err());
    assert!(parse_role_and_modules("boss", None).is_err());
}

#[test]
fn parse_role_dedupes_modules() {
    let modules = vec!["okr".to_owned(), "okr".to_owned(), "financeiro".to_owned()];
    let (role, parsed) = parse_role_and_modules("editor", Some(&modules)).unwrap();
    assert_eq!(role, TenantRole::Editor);
    assert_eq!(parsed, Some(vec![Module::Okr, Module::Financeiro]));
}

#[test]
fn parse_role_rejects_unknown_module() {
    let modules = vec!["estoque".to_owned()];
    let err = parse_role_and_modules("viewer", Some(&modules)).unwrap_err();
    assert_eq!(err.fields[0].field, "modules");
}

#[test]
fn tenant_input_normalizes_cnpj_and_blank_legal_name() {
    let input = TenantInput {
        name: "  Padaria Central ".into(),
        legal_name: Some("   ".into()),
        cnpj: Some("11.222.333/0001-81".into()),
    };
    let (name, legal_name, cnpj) = normalize_tenant_input(&input).unwrap();
    assert_eq!(name, "Padaria Central");
    assert!(legal_name.is_none());
    assert_eq!(cnpj.as_deref(), Some("11222333000181"));
}

#[test]
fn tenant_input_rejects_bad_cnpj() {
    let input = TenantInput { name: "X".into(), legal_name: None, cnpj: Some("11.222.333/0001-00".into()) };
    let err = normalize_tenant_input(&input).unwrap_err();
    assert_eq!(err.fields[0].field, "cnpj");
}

#[test]
fn modules_db_roundtrip_skips_unknown() {
    let raw = Some(vec!["okr".to_owned(), "legacy".to_owned()]);
    assert_eq!(modules_from_db(raw), Some(vec![Module::Okr]));
    assert_eq!(modules_to_db(Some(&[Module::Cadastros])), Some(vec!["cadastros".to_owned()]));
    assert_eq!(modules_to_db(None), None);
}

// =============================================================================
// errors
// =============================================================================

#[test]
fn tenant_error_statuses() {
    assert_eq!(TenantError::NotMember(Uuid::nil()).status(), StatusCode::FORBIDDEN);
    assert_eq!(TenantError::OwnerImmutable.status(), StatusCode::CONFLICT);
    assert_eq!(TenantError::UserNotFound("a@b.c".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(TenantError::CnpjTaken.error_code(), "E_TENANT_CNPJ_TAKEN");
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn tenant_creation_makes_creator_owner() {
    let pool = crate::state::test_helpers::integration_pool().await;
    let owner = crate::state::test_helpers::seed_user(&pool, "owner@teste.com").await;

    let tenant = create_tenant(&pool, owner, &TenantInput { name: "Loja".into(), legal_name: None, cnpj: None })
        .await
        .unwrap();
    let membership = load_membership(&pool, tenant.id, owner).await.unwrap().unwrap();
    assert_eq!(membership.role, TenantRole::Owner);
    assert!(matches!(remove_member(&pool, tenant.id, owner).await, Err(TenantError::OwnerImmutable)));
}
