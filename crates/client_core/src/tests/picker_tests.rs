use proptest::prelude::*;

use super::*;
use crate::{memory::MemoryPage, page::PickerKind};

fn stack_with(page: MemoryPage, max_pending: usize) -> (PickerCallbackStack, Arc<MemoryPage>) {
    let page = Arc::new(page);
    let stack = PickerCallbackStack::with_max_pending(page.clone(), page.clone(), max_pending);
    (stack, page)
}

#[test]
fn single_launch_opens_widget_with_resolver_names() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack.launch_single("fo_orders", "due").expect("launch");

    let launches = page.picker_launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].kind, PickerKind::Single);
    assert_eq!(launches[0].single_callback, "picker.resolve_single");
    assert_eq!(launches[0].range_callback, None);
    assert_eq!(stack.pending(), 1);
}

#[test]
fn resolve_single_writes_primary_field() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack.launch_single("fo_orders", "due").expect("launch");

    let applied = stack.resolve_single("2024-03-01").expect("resolve");

    assert_eq!(page.field("fo_orders", "due").as_deref(), Some("2024-03-01"));
    assert!(!applied.submitted);
    assert!(page.submissions().is_empty());
    assert!(!stack.is_armed());
}

#[test]
fn resolve_range_splits_pair() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack
        .launch_range("fo_orders", "from", "to")
        .expect("launch");
    assert_eq!(page.picker_launches()[0].kind, PickerKind::Range);
    assert_eq!(
        page.picker_launches()[0].range_callback,
        Some("picker.resolve_range")
    );

    stack
        .resolve_range("2024-01-01|2024-01-31")
        .expect("resolve");

    assert_eq!(page.field("fo_orders", "from").as_deref(), Some("2024-01-01"));
    assert_eq!(page.field("fo_orders", "to").as_deref(), Some("2024-01-31"));
}

#[test]
fn single_value_on_upper_range_launch_lands_in_upper_field() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack
        .launch_range_upper("fo_orders", "from", "to")
        .expect("launch");

    stack.resolve_single("2024-02-29").expect("resolve");

    assert_eq!(page.field("fo_orders", "to").as_deref(), Some("2024-02-29"));
    assert_eq!(page.field("fo_orders", "from"), None);
}

#[test]
fn auto_submit_is_terminal() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack
        .launch_single_with_operator("fo_list", "VLdue", "OPdue", "2", true)
        .expect("launch");

    let applied = stack.resolve_single("2024-05-05").expect("resolve");

    assert!(applied.submitted);
    assert_eq!(page.submissions(), vec![FormId::from("fo_list")]);
    assert_eq!(page.field("fo_list", "OPdue"), None);
}

#[test]
fn operator_field_written_without_auto_submit() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack
        .launch_single_with_operator("fo_list", "VLdue", "OPdue", "2", false)
        .expect("launch");

    stack.resolve_single("2024-05-05").expect("resolve");

    assert_eq!(page.field("fo_list", "VLdue").as_deref(), Some("2024-05-05"));
    assert_eq!(page.field("fo_list", "OPdue").as_deref(), Some("2"));
    assert!(page.submissions().is_empty());
}

#[test]
fn search_single_fills_value_field_and_submits() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack.launch_search_single("fo_list", "due").expect("launch");

    stack.resolve_single("2024-05-05").expect("resolve");

    assert_eq!(page.field("fo_list", "VLdue").as_deref(), Some("2024-05-05"));
    assert_eq!(page.submissions(), vec![FormId::from("fo_list")]);
}

#[test]
fn search_range_sets_operator_codes() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);

    stack
        .launch_search_range("fo_list", "due", RangeEnd::Lower)
        .expect("launch");
    stack.resolve_single("2024-01-01").expect("resolve");
    assert_eq!(page.field("fo_list", "VLdue").as_deref(), Some("2024-01-01"));
    assert_eq!(page.field("fo_list", "OPdue").as_deref(), Some("2"));

    stack
        .launch_search_range("fo_list", "due", RangeEnd::Upper)
        .expect("launch");
    stack.resolve_single("2024-12-31").expect("resolve");
    assert_eq!(page.field("fo_list", "VFdue").as_deref(), Some("2024-12-31"));
    assert_eq!(page.field("fo_list", "OPdue").as_deref(), Some("8"));

    stack
        .launch_search_range("fo_list", "due", RangeEnd::Lower)
        .expect("launch");
    let applied = stack
        .resolve_range("2024-02-01|2024-02-28")
        .expect("resolve");
    assert_eq!(page.field("fo_list", "VLdue").as_deref(), Some("2024-02-01"));
    assert_eq!(page.field("fo_list", "VFdue").as_deref(), Some("2024-02-28"));
    assert_eq!(page.field("fo_list", "OPdue").as_deref(), Some("8"));
    assert_eq!(applied.fields.len(), 3);
}

#[test]
fn resolve_without_launch_fails_fast() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    assert_eq!(
        stack.resolve_single("x"),
        Err(BindingError::NoPendingBinding)
    );
    assert_eq!(
        stack.resolve_range("a|b"),
        Err(BindingError::NoPendingBinding)
    );
    assert!(page.submissions().is_empty());
}

#[test]
fn second_launch_is_refused_while_one_is_outstanding() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack.launch_single("fo_a", "due").expect("launch");

    assert_eq!(
        stack.launch_single("fo_b", "due"),
        Err(BindingError::PickerAlreadyOutstanding { depth: 1 })
    );
    assert_eq!(page.picker_launches().len(), 1);

    stack.resolve_single("v").expect("resolve");
    assert_eq!(page.field("fo_a", "due").as_deref(), Some("v"));
    stack.launch_single("fo_b", "due").expect("launch after resolve");
}

#[test]
fn malformed_range_consumes_binding_without_writing() {
    let (mut stack, page) = stack_with(MemoryPage::new(), 1);
    stack.launch_range("fo", "from", "to").expect("launch");

    assert_eq!(
        stack.resolve_range("2024-01-01"),
        Err(BindingError::MalformedRange {
            value: "2024-01-01".into()
        })
    );
    assert_eq!(page.field("fo", "from"), None);
    assert!(!stack.is_armed());
}

#[test]
fn range_value_for_single_binding_is_rejected() {
    let (mut stack, _page) = stack_with(MemoryPage::new(), 1);
    stack.launch_single("fo", "due").expect("launch");
    assert_eq!(
        stack.resolve_range("a|b"),
        Err(BindingError::NotRangeBinding {
            form: FormId::from("fo")
        })
    );
}

#[derive(Debug, Clone)]
enum Launch {
    Single { field: String },
    Range { lower: String, upper: String },
}

fn arb_launch() -> impl Strategy<Value = Launch> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|field| Launch::Single { field }),
        ("[a-z]{1,8}", "[a-z]{1,8}").prop_map(|(lower, upper)| Launch::Range {
            lower: format!("lo_{lower}"),
            upper: format!("hi_{upper}")
        }),
    ]
}

proptest! {
    #[test]
    fn nested_launches_resolve_to_matching_fields(
        launches in prop::collection::vec(arb_launch(), 1..8),
    ) {
        let (mut stack, page) = stack_with(MemoryPage::new(), launches.len());
        for (index, launch) in launches.iter().enumerate() {
            let form = format!("fo_{index}");
            let launched = match launch {
                Launch::Single { field } => stack.launch_single(form, field.as_str()),
                Launch::Range { lower, upper } => {
                    stack.launch_range(form, lower.as_str(), upper.as_str())
                }
            };
            launched.expect("launch");
        }

        for (index, launch) in launches.iter().enumerate().rev() {
            let form = format!("fo_{index}");
            match launch {
                Launch::Single { field } => {
                    let applied = stack.resolve_single(&format!("v{index}")).expect("resolve");
                    prop_assert_eq!(applied.form.as_str(), form.as_str());
                    let value = format!("v{index}");
                    let got = page.field(&form, field);
                    prop_assert_eq!(got.as_deref(), Some(value.as_str()));
                }
                Launch::Range { lower, upper } => {
                    let applied = stack
                        .resolve_range(&format!("a{index}|b{index}"))
                        .expect("resolve");
                    prop_assert_eq!(applied.form.as_str(), form.as_str());
                    let a = format!("a{index}");
                    let b = format!("b{index}");
                    let got_lower = page.field(&form, lower);
                    let got_upper = page.field(&form, upper);
                    prop_assert_eq!(got_lower.as_deref(), Some(a.as_str()));
                    prop_assert_eq!(got_upper.as_deref(), Some(b.as_str()));
                }
            }
        }
        prop_assert_eq!(stack.pending(), 0);
    }
}
