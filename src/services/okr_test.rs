use super::*;
use time::macros::date;

fn task(key_result_id: Uuid, parent: Option<Uuid>, done: bool) -> Task {
    Task {
        id: Uuid::new_v4(),
        key_result_id,
        parent_task_id: parent,
        title: "Tarefa".into(),
        done,
        due_date: None,
        assignee_id: None,
    }
}

// =============================================================================
// PROGRESS
// =============================================================================

#[test]
fn progress_is_position_between_start_and_target() {
    assert!((key_result_progress(0.0, 200.0, 50.0) - 25.0).abs() < f64::EPSILON);
    assert!((key_result_progress(10.0, 20.0, 15.0) - 50.0).abs() < f64::EPSILON);
}

#[test]
fn progress_works_for_decreasing_targets() {
    // Churn from 8% down to 2%.
    assert!((key_result_progress(8.0, 2.0, 5.0) - 50.0).abs() < f64::EPSILON);
}

#[test]
fn progress_is_clamped() {
    assert!((key_result_progress(0.0, 100.0, 140.0) - 100.0).abs() < f64::EPSILON);
    assert!(key_result_progress(0.0, 100.0, -20.0).abs() < f64::EPSILON);
    assert!(key_result_progress(5.0, 5.0, 7.0).abs() < f64::EPSILON);
}

#[test]
fn objective_progress_is_mean_of_key_results() {
    assert!(objective_progress(&[]).abs() < f64::EPSILON);
    assert!((objective_progress(&[100.0, 50.0, 0.0]) - 50.0).abs() < f64::EPSILON);
}

// =============================================================================
// VALIDATION
// =============================================================================

#[test]
fn objective_period_must_be_ordered() {
    let input = ObjectiveInput {
        title: "Crescer receita".into(),
        description: None,
        period_start: date!(2024 - 07 - 01),
        period_end: date!(2024 - 06 - 30),
        owner_id: None,
    };
    let err = validate_objective(&input).unwrap_err();
    assert_eq!(err.fields[0].field, "period_end");
}

#[test]
fn key_result_target_must_differ_from_start() {
    let input = KeyResultInput {
        title: "NPS".into(),
        start_value: Some(40.0),
        target_value: 40.0,
        current_value: None,
        unit: None,
    };
    let err = validate_key_result(&input).unwrap_err();
    assert_eq!(err.fields[0].field, "target_value");
}

#[test]
fn key_result_rejects_non_finite_values() {
    let input = KeyResultInput {
        title: "Receita".into(),
        start_value: None,
        target_value: f64::INFINITY,
        current_value: Some(f64::NAN),
        unit: Some("R$".into()),
    };
    let err = validate_key_result(&input).unwrap_err();
    let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["target_value", "current_value"]);
}

#[test]
fn task_title_is_required() {
    let input = TaskInput { title: " ".into(), parent_task_id: None, due_date: None, assignee_id: None, done: None };
    assert!(validate_task(&input).is_err());
}

// =============================================================================
// TASK TREE
// =============================================================================

#[test]
fn subtasks_nest_one_level_only() {
    let kr = Uuid::new_v4();
    let root = task(kr, None, false);
    let child = task(kr, Some(root.id), false);

    assert!(check_task_parent(&root, kr).is_ok());
    assert_eq!(check_task_parent(&child, kr).unwrap_err().fields[0].message, "Subtarefas não podem ter subtarefas");
    assert!(check_task_parent(&root, Uuid::new_v4()).is_err());
}

#[test]
fn task_tree_groups_subtasks_and_counts_completion() {
    let kr = Uuid::new_v4();
    let first = task(kr, None, true);
    let second = task(kr, None, false);
    let sub_a = task(kr, Some(first.id), true);
    let sub_b = task(kr, Some(first.id), false);
    let orphan = task(kr, Some(Uuid::new_v4()), false);

    let tree = build_task_tree(
        kr,
        vec![first.clone(), sub_a.clone(), second.clone(), sub_b.clone(), orphan],
    );

    assert_eq!(tree.tasks.len(), 2);
    assert_eq!(tree.tasks[0].task.id, first.id);
    assert_eq!(tree.tasks[0].subtasks, vec![sub_a, sub_b]);
    assert!(tree.tasks[1].subtasks.is_empty());
    assert_eq!((tree.done, tree.total), (2, 5));
    assert!((tree.completion - 40.0).abs() < f64::EPSILON);
    assert_eq!(tree.completion_formatted, "40,0%");
}

#[test]
fn empty_task_tree_has_zero_completion() {
    let tree = build_task_tree(Uuid::new_v4(), Vec::new());
    assert_eq!(tree.total, 0);
    assert!(tree.completion.abs() < f64::EPSILON);
}

#[test]
fn okr_error_statuses() {
    assert_eq!(OkrError::TaskNotFound(Uuid::nil()).status(), StatusCode::NOT_FOUND);
    assert_eq!(OkrError::ObjectiveNotFound(Uuid::nil()).error_code(), "E_OBJECTIVE_NOT_FOUND");
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn objective_detail_reports_key_result_progress() {
    use crate::state::test_helpers;

    let pool = test_helpers::integration_pool().await;
    let (tenant_id, owner) = test_helpers::seed_tenant(&pool).await;
    let objective = create_objective(
        &pool,
        tenant_id,
        &ObjectiveInput {
            title: "Crescer receita".into(),
            description: None,
            period_start: date!(2024 - 01 - 01),
            period_end: date!(2024 - 03 - 31),
            owner_id: Some(owner),
        },
    )
    .await
    .unwrap();

    let kr = create_key_result(
        &pool,
        tenant_id,
        objective.id,
        &KeyResultInput { title: "MRR".into(), start_value: None, target_value: 100.0, current_value: None, unit: None },
    )
    .await
    .unwrap();
    check_in(&pool, tenant_id, kr.id, 25.0).await.unwrap();

    let detail = get_objective(&pool, tenant_id, objective.id).await.unwrap();
    assert!((detail.objective.progress - 25.0).abs() < f64::EPSILON);

    let outsider = test_helpers::seed_user(&pool, "fora@teste.com").await;
    let err = create_task(
        &pool,
        tenant_id,
        kr.id,
        &TaskInput { title: "Ligar".into(), parent_task_id: None, due_date: None, assignee_id: Some(outsider), done: None },
    )
    .await
    .unwrap_err();
    assert_eq!(err.fields()[0].field, "assignee_id");
}
