use sprout_graft::{generate, CodegenOptions, CodegenResult, EffectPlan, ViewNode};
use sprout_seed::Bump;

fn compile(source: &str, name: &str) -> CodegenResult {
    let allocator = Bump::new();
    let component = sprout_trellis::parse(&allocator, source).unwrap();
    generate(&component, name, &CodegenOptions::default())
}

#[test]
fn test_counter_module() {
    let result = compile(
        "$count:0\n---\nbutton[!click($count++) \"Count: @{$count}\"]",
        "counter",
    );
    insta::assert_snapshot!(result.code.trim_end(), @r#"
    import { signal as _signal, h as _h, text as _text } from "sprout/runtime";

    export default function Counter() {
      const $count = _signal(0);
      return [
        _h("button", { onClick: (e) => {
          $count.value++;
        } }, [
          "Count: ",
          _text(() => $count.value)
        ])
      ];
    }
    "#);
    assert!(result.css.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_computed_and_guarded_effect() {
    let result = compile(
        "$count:0\n$double := $count * 2\n~ $double > 10, $count < 100 |> log(\"big\", $double)\n---\np[$double]",
        "Counter",
    );
    assert!(result.code.contains("const $double = _computed(() => $count.value * 2);"));
    assert!(result
        .code
        .contains("if ($double.value > 10 && $count.value < 100) {"));
    assert!(result
        .code
        .contains(r#"console.log("big", $double.value);"#));
    assert!(result.code.contains("_effect(() => {"));
}

#[test]
fn test_fetch_pipeline() {
    let source = r#"
$items:[]
~ fetch("/api/items") |> json |> .data |> $items
---
ul
  $items
    li[:name]
"#;
    let result = compile(source, "ItemList");
    assert!(result.code.starts_with(
        r#"import { signal as _signal, onMount as _onMount, reportError as _reportError, h as _h, list as _list } from "sprout/runtime";"#
    ));
    let expected = r#"
  _onMount(() => {
    fetch("/api/items")
      .then((_r) => _r.json())
      .then((_v) => _v?.data)
      .then((_v) => {
        $items.value = _v;
      })
      .catch(_reportError);
  });"#;
    assert!(result.code.contains(expected), "{}", result.code);
    assert!(result.code.contains("_list($items, (_item) => ["));
    assert!(result.code.contains("String(_item.name)"));

    let EffectPlan::Fetch(fetch) = &result.program.effects[0] else {
        panic!("Expected fetch effect");
    };
    assert_eq!(fetch.target, "items");
}

#[test]
fn test_component_imports() {
    let result = compile("---\n::Header\nmain\n  ::Footer", "Page");
    let lines: Vec<&str> = result.code.lines().take(3).collect();
    assert_eq!(
        lines,
        [
            r#"import { h as _h } from "sprout/runtime";"#,
            r#"import Header from "./Header.js";"#,
            r#"import Footer from "./Footer.js";"#,
        ]
    );
    assert!(result.code.contains("_h(Header, null, [])"));
}

#[test]
fn test_custom_runtime_module() {
    let allocator = Bump::new();
    let component = sprout_trellis::parse(&allocator, "---\np[\"hi\"]").unwrap();
    let options = CodegenOptions {
        runtime_module: "@app/runtime".to_string(),
        ..Default::default()
    };
    let result = generate(&component, "Hello", &options);
    assert!(result
        .code
        .starts_with(r#"import { h as _h } from "@app/runtime";"#));
}

#[test]
fn test_local_classes_scoped_per_component() {
    let source = "---\ndiv.container.p-4\n  span.container[\"x\"]";
    let header = compile(source, "Header");
    let footer = compile(source, "Footer");
    assert_ne!(header.scope_tag, footer.scope_tag);

    let header_selector = format!(".container-{} {{}}", header.scope_tag);
    let footer_selector = format!(".container-{} {{}}", footer.scope_tag);
    assert_eq!(header.css, format!("{header_selector}\n"));
    assert_eq!(footer.css, format!("{footer_selector}\n"));

    let ViewNode::Element(div) = &header.program.view[0] else {
        panic!("Expected element");
    };
    assert_eq!(
        div.class.as_deref(),
        Some(format!("container-{} p-4", header.scope_tag).as_str())
    );
}

#[test]
fn test_scope_tag_is_stable() {
    let first = compile("---\ndiv.box", "Card");
    let second = compile("---\ndiv.box", "Card");
    assert_eq!(first.scope_tag, second.scope_tag);
    assert_eq!(first.css, second.css);
    assert_eq!(first.scope_tag.len(), 6);
}

#[test]
fn test_arbitrary_value_rules() {
    let result = compile("---\ndiv.w-[320px].hover:bg-[#eee]", "Panel");
    insta::assert_snapshot!(result.css, @r"
    .w-\[320px\] {
      width: 320px;
    }
    .hover\:bg-\[\#eee\]:hover {
      background-color: #eee;
    }
    ");
}
