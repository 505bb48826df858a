use sprout_seed::expr::Expr;
use sprout_seed::{AttributeValue, EffectAction, FetchStage};
use sprout_trellis::{find_content_open, parse, Bump, ErrorCode, Node};

const COUNTER: &str = r#"
// A counter with a derived value
$count:0
$double := $count * 2
~ $count > 5 |> log("big")
%card = section.card.p-4
---
%card
  h1.title["Count: @{$count}"]
  button.btn[!click($count++) "Increment"]
  ? $double > 10
    p["large"]
  ? else
    p["small"]
  ::Footer
::Footer
"#;

#[test]
fn test_counter_component() {
    let allocator = Bump::new();
    let component = parse(&allocator, COUNTER).unwrap();

    assert_eq!(component.states.len(), 2);
    assert!(component.states[1].computed);
    assert_eq!(component.effects.len(), 1);
    assert_eq!(component.effects[0].dependencies.len(), 1);
    assert_eq!(component.imports.as_slice(), ["Footer"]);
    assert_eq!(component.nodes.len(), 2);

    let Node::Element(card) = &component.nodes[0] else {
        panic!("expected the aliased element");
    };
    assert_eq!(card.tag, "section");
    assert_eq!(card.classes.as_slice(), ["card", "p-4"]);
    assert_eq!(card.children.len(), 4);

    let Node::Conditional(conditional) = &card.children[2] else {
        panic!("expected a conditional");
    };
    assert_eq!(conditional.condition.source, "$double > 10");
    assert_eq!(conditional.true_branch.len(), 1);
    assert_eq!(conditional.false_branch.len(), 1);
    assert!(matches!(card.children[3], Node::Component(ref name) if name == "Footer"));
}

#[test]
fn test_indentation_unit_does_not_matter() {
    let two = "$items:[]\n---\nul.list\n  $items\n    li\n      span[:name]\n      !click(log(:id))\np[\"done\"]";
    let four =
        "$items:[]\n---\nul.list\n    $items\n        li\n            span[:name]\n            !click(log(:id))\np[\"done\"]";
    let tabs = "$items:[]\n---\nul.list\n\t$items\n\t\tli\n\t\t\tspan[:name]\n\t\t\t!click(log(:id))\np[\"done\"]";

    let (a, b, c) = (Bump::new(), Bump::new(), Bump::new());
    let two = parse(&a, two).unwrap();
    let four = parse(&b, four).unwrap();
    let tabs = parse(&c, tabs).unwrap();
    assert_eq!(two, four);
    assert_eq!(two, tabs);

    let Node::Element(list) = &two.nodes[0] else {
        panic!("expected an element");
    };
    let Node::Loop(each) = &list.children[0] else {
        panic!("expected a loop");
    };
    assert_eq!(each.array.expr, Expr::State("items".into()));
    assert_eq!(each.template.len(), 1);
}

#[test]
fn test_variable_without_block() {
    let allocator = Bump::new();
    let component = parse(&allocator, "$name:\"\"\n---\ndiv\n  $name\n  // trailing comment\np").unwrap();
    let Node::Element(div) = &component.nodes[0] else {
        panic!("expected an element");
    };
    assert_eq!(div.children[0], Node::Variable("name".into()));
    assert_eq!(component.nodes.len(), 2);
}

#[test]
fn test_arbitrary_value_brackets_never_open_content() {
    let lines = [
        ("div.w-[200px]", None),
        ("div.w-[200px][\"x\"]", Some(13)),
        (".bg-[#0af].text-[14px]", None),
        (".grid-cols-[repeat(3,_1fr)].gap-[1rem][$a]", Some(38)),
    ];
    for (line, expected) in lines {
        assert_eq!(find_content_open(line), expected, "{line}");
    }

    let allocator = Bump::new();
    let component = parse(&allocator, "---\ndiv.w-[200px].bg-[#fff]").unwrap();
    let Node::Element(div) = &component.nodes[0] else {
        panic!("expected an element");
    };
    assert_eq!(div.classes.as_slice(), ["w-[200px]", "bg-[#fff]"]);
    assert!(div.children.is_empty());
}

#[test]
fn test_fence_inside_nested_block() {
    let source = "---\ndiv\n  pre[```\nfn main() {}\n  // not a comment here\n```]\n  p[\"after\"]";
    let allocator = Bump::new();
    let component = parse(&allocator, source).unwrap();
    assert_eq!(component.nodes.len(), 1);

    let Node::Element(div) = &component.nodes[0] else {
        panic!("expected an element");
    };
    assert_eq!(div.children.len(), 2);
    let Node::Element(pre) = &div.children[0] else {
        panic!("expected pre");
    };
    assert_eq!(
        pre.children.as_slice(),
        [
            Node::CodeLine("fn main() {}".into()),
            Node::CodeLine("  // not a comment here".into()),
        ]
    );
}

#[test]
fn test_fetch_effect_and_input_binding() {
    let source = r#"
$items:[]
$query:""
~ fetch("/api/items") |> json |> .data |> $items
---
input.search[$query placeholder{"Search"}]
"#;
    let allocator = Bump::new();
    let component = parse(&allocator, source).unwrap();
    let EffectAction::Fetch(pipeline) = &component.effects[0].action else {
        panic!("expected a fetch effect");
    };
    assert_eq!(pipeline.stages, vec![FetchStage::Json, FetchStage::Field(vec!["data".into()])]);

    let Node::Element(input) = &component.nodes[0] else {
        panic!("expected an element");
    };
    assert!(input.is_input_like());
    assert_eq!(input.children[0], Node::Variable("query".into()));
    assert_eq!(input.attributes[0].value, AttributeValue::Static("Search".into()));
}

#[test]
fn test_diagnostics() {
    let cases = [
        ("$a:1\n$a:2\n---", ErrorCode::DuplicateState, 2),
        ("~ fetch(\"/x\") |> json |> $missing\n---", ErrorCode::InvalidFetchPipeline, 1),
        ("---\n%nope[\"x\"]", ErrorCode::UnknownAlias, 2),
        ("---\n::footer", ErrorCode::InvalidComponentName, 2),
        ("---\n::Footer\n  p", ErrorCode::UnexpectedChildren, 3),
        ("---\np\n? else", ErrorCode::DanglingElse, 3),
        ("---\n? true\n  p\n? else\n? else", ErrorCode::DanglingElse, 5),
        ("---\n!click(log(1))", ErrorCode::ContentOutsideElement, 2),
        ("---\n? true\n  href{\"/\"}", ErrorCode::ContentOutsideElement, 3),
        ("---\nh1[\"x\"] extra", ErrorCode::UnexpectedContent, 2),
        ("---\nh1[\"x\"", ErrorCode::UnclosedContent, 2),
        ("---\np[x{$a +}]", ErrorCode::InvalidExpression, 2),
        ("---\np[$nope]", ErrorCode::UnknownState, 2),
        ("---\n? $open\n  p", ErrorCode::UnknownState, 2),
        ("---\nul\n  $rows\n    li", ErrorCode::UnknownState, 3),
        ("~ $ready |> log(1)\n---", ErrorCode::UnknownState, 1),
        ("---\np[:name]", ErrorCode::ItemOutsideLoop, 2),
        ("---\nh1 title", ErrorCode::InvalidElementHeader, 2),
        ("---\n\"text\"\n  p", ErrorCode::UnexpectedChildren, 3),
        ("div\n---", ErrorCode::UnrecognizedPreambleLine, 1),
    ];

    for (source, code, line) in cases {
        let allocator = Bump::new();
        let err = parse(&allocator, source).unwrap_err();
        assert_eq!((err.code, err.line), (code, line), "{source}");
    }
}

#[test]
fn test_else_must_be_adjacent() {
    let allocator = Bump::new();
    let err = parse(&allocator, "---\n? true\n  p\nspan\n? else\n  p").unwrap_err();
    assert_eq!(err.code, ErrorCode::DanglingElse);

    // Comments and blank lines may sit between the branches
    let component = parse(&allocator, "---\n? true\n  p\n\n// otherwise\n? else\n  span").unwrap();
    let Node::Conditional(conditional) = &component.nodes[0] else {
        panic!("expected a conditional");
    };
    assert_eq!(conditional.false_branch.len(), 1);
}

#[test]
fn test_undeclared_state_is_positioned() {
    let allocator = Bump::new();
    let err = parse(&allocator, "$count:0\n---\nbutton[!click($ghost++) \"x\"]").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownState);
    assert_eq!((err.line, err.column), (3, 15));
    assert_eq!(err.detail, "state `$ghost` is not declared");

    let err = parse(&allocator, "$a:1\n$b := $a + $c\n---").unwrap_err();
    assert_eq!((err.code, err.line, err.column), (ErrorCode::UnknownState, 2, 12));
}

#[test]
fn test_item_fields_only_inside_loops() {
    let allocator = Bump::new();
    let err = parse(&allocator, "---\np[:name]\nh1[\"@{:title}\"]").unwrap_err();
    assert_eq!((err.code, err.line, err.column), (ErrorCode::ItemOutsideLoop, 2, 3));

    let err = parse(&allocator, "---\nh1[\"@{:title}\"]").unwrap_err();
    assert_eq!((err.code, err.column), (ErrorCode::ItemOutsideLoop, 7));

    let err = parse(&allocator, "---\na[href{:url}]").unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemOutsideLoop);

    // Everything below the loop line sees the item, conditions included
    let source = "$rows:[]\n---\nul\n  $rows\n    ? :done\n      li[:title]\n    ? else\n      li[\"@{:title}\"]";
    let component = parse(&allocator, source).unwrap();
    let Node::Element(ul) = &component.nodes[0] else {
        panic!("expected an element");
    };
    assert!(matches!(ul.children[0], Node::Loop(_)));

    // The loop's own siblings do not
    let err = parse(&allocator, "$rows:[]\n---\nul\n  $rows\n    li[:title]\n  p[:title]").unwrap_err();
    assert_eq!((err.code, err.line), (ErrorCode::ItemOutsideLoop, 6));
}

#[test]
fn test_variable_then_field_content_line() {
    let allocator = Bump::new();
    let source = "$label:\"x\"\n$rows:[]\n---\nul\n  $rows\n    li\n      $label :name";
    let component = parse(&allocator, source).unwrap();
    let Node::Element(ul) = &component.nodes[0] else {
        panic!("expected an element");
    };
    let Node::Loop(each) = &ul.children[0] else {
        panic!("expected a loop");
    };
    let Node::Element(li) = &each.template[0] else {
        panic!("expected an element");
    };
    assert_eq!(
        li.children.as_slice(),
        [Node::Variable("label".into()), Node::PropertyAccess("name".into())]
    );

    // A real declaration below the separator is still rejected
    let err = parse(&allocator, "---\n$count:0").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnexpectedContent);
}
