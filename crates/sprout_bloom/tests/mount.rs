use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use sprout_bloom::{
    DeferredFetcher, Document, FetchResponse, Fetcher, Host, MountError, Renderer, StaticFetcher,
};
use sprout_graft::RenderProgram;
use sprout_sap::Runtime;
use sprout_seed::Bump;

fn program(source: &str, name: &str) -> RenderProgram {
    let allocator = Bump::new();
    let component = sprout_trellis::parse(&allocator, source).unwrap();
    sprout_graft::lower(&component, name).0
}

fn setup() -> (Runtime, Rc<Document>, Rc<RefCell<Vec<String>>>) {
    let runtime = Runtime::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();
    runtime.on_error(move |error| sink.borrow_mut().push(error.to_string()));
    (runtime, Rc::new(Document::new()), errors)
}

#[test]
fn test_counter_updates_only_its_text() {
    let (runtime, doc, errors) = setup();
    let counter = program(
        "$count:0\n---\nbutton[!click($count++) \"Count: @{$count}\"]",
        "Counter",
    );
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .mount(&counter, doc.root())
        .unwrap();
    assert_eq!(doc.to_html(doc.root()), "<button>Count: 0</button>");

    let button = doc.query("button").unwrap();
    let children = doc.children(button);
    assert!(doc.dispatch(button, "click"));
    assert!(doc.dispatch(button, "click"));

    assert_eq!(doc.to_html(doc.root()), "<button>Count: 2</button>");
    assert_eq!(mounted.state("count"), Some(json!(2)));
    // Same element, same text nodes
    assert_eq!(doc.query("button"), Some(button));
    assert_eq!(doc.children(button), children);
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_static_interpolation_is_read_once() {
    let (runtime, doc, _) = setup();
    let greeting = program("$name:\"Ada\"\n---\np[\"#{$name} / @{$name}\"]", "Greeting");
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .mount(&greeting, doc.root())
        .unwrap();
    assert_eq!(doc.to_html(doc.root()), "<p>Ada / Ada</p>");

    assert_eq!(mounted.set_state("name", json!("Grace")), Ok(true));
    assert_eq!(doc.to_html(doc.root()), "<p>Ada / Grace</p>");
}

#[test]
fn test_conditional_switches_branches() {
    let (runtime, doc, _) = setup();
    let toggle = program(
        "$open:false\n---\nbutton[!click($open = !$open) \"Toggle\"]\n? $open\n  p[\"Open\"]\n? else\n  p[\"Closed\"]",
        "Toggle",
    );
    Renderer::new(runtime.clone(), doc.clone())
        .mount(&toggle, doc.root())
        .unwrap();
    assert_eq!(doc.to_html(doc.root()), "<button>Toggle</button><p>Closed</p>");

    let button = doc.query("button").unwrap();
    doc.dispatch(button, "click");
    assert_eq!(doc.to_html(doc.root()), "<button>Toggle</button><p>Open</p>");
    doc.dispatch(button, "click");
    assert_eq!(doc.to_html(doc.root()), "<button>Toggle</button><p>Closed</p>");
}

#[test]
fn test_list_rebuilds_every_item() {
    let (runtime, doc, _) = setup();
    let list = program(
        "$items:[\"a\", \"b\"]\n---\nul\n  $items\n    li[\"@{:_index}: \" :value]\nbutton[!click($items.push(\"c\")) \"Add\"]",
        "List",
    );
    Renderer::new(runtime.clone(), doc.clone())
        .mount(&list, doc.root())
        .unwrap();
    assert_eq!(
        doc.to_html(doc.query("ul").unwrap()),
        "<li>0: a</li><li>1: b</li>"
    );
    let first = doc.query("li").unwrap();

    doc.dispatch(doc.query("button").unwrap(), "click");
    assert_eq!(
        doc.to_html(doc.query("ul").unwrap()),
        "<li>0: a</li><li>1: b</li><li>2: c</li>"
    );
    assert!(!doc.contains(first));
}

#[test]
fn test_list_replacement_discards_every_node() {
    let (runtime, doc, _) = setup();
    let list = program("$items:[\"a\", \"b\"]\n---\nul\n  $items\n    li[:value]", "List");
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .mount(&list, doc.root())
        .unwrap();
    let ul = doc.query("ul").unwrap();
    let before = doc.query_all(ul, "li");
    assert_eq!(before.len(), 2);

    // Same length, different items: nothing is patched in place
    mounted.set_state("items", json!(["c", "d"])).unwrap();
    let after = doc.query_all(ul, "li");
    assert_eq!(doc.to_html(ul), "<li>c</li><li>d</li>");
    assert_eq!(after.len(), 2);
    for node in &before {
        assert!(!doc.contains(*node));
        assert!(!after.contains(node));
    }
}

#[test]
fn test_fetched_list_is_rebuilt_on_write() {
    let (runtime, doc, errors) = setup();
    let users = program(
        "$users:[]\n~ fetch(\"/api/users\") |> json |> $users\n---\nul\n  $users\n    li[:name]",
        "Users",
    );
    let fetcher = Rc::new(DeferredFetcher::new());
    let shared: Rc<dyn Fetcher> = fetcher.clone();
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(shared)
        .mount(&users, doc.root())
        .unwrap();
    let ul = doc.query("ul").unwrap();
    assert!(doc.query_all(ul, "li").is_empty());

    let body = json!([{"name": "Ada"}, {"name": "Grace"}]).to_string();
    assert!(fetcher.resolve("/api/users", Ok(FetchResponse::ok(body))));
    let fetched = doc.query_all(ul, "li");
    assert_eq!(doc.to_html(ul), "<li>Ada</li><li>Grace</li>");

    mounted
        .set_state(
            "users",
            json!([{"name": "Ada"}, {"name": "Grace"}, {"name": "Linus"}]),
        )
        .unwrap();
    let written = doc.query_all(ul, "li");
    assert_eq!(doc.to_html(ul), "<li>Ada</li><li>Grace</li><li>Linus</li>");
    assert_eq!(written.len(), 3);
    assert!(fetched.iter().all(|node| !doc.contains(*node) && !written.contains(node)));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_input_binding() {
    let (runtime, doc, _) = setup();
    let form = program(
        "$name:\"\"\n$done:false\n---\ninput[$name]\ninput[type{\"checkbox\"} $done]\np[\"Hi @{$name}\"]",
        "Form",
    );
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .mount(&form, doc.root())
        .unwrap();
    let inputs = doc.query_all(doc.root(), "input");
    assert_eq!(doc.property(inputs[0], "value"), Some(json!("")));
    assert_eq!(doc.property(inputs[1], "checked"), Some(json!(false)));

    doc.set_property(inputs[0], "value", json!("Ada"));
    doc.dispatch(inputs[0], "input");
    assert_eq!(mounted.state("name"), Some(json!("Ada")));
    assert_eq!(doc.text_content(doc.query("p").unwrap()), "Hi Ada");

    doc.set_property(inputs[1], "checked", json!(true));
    doc.dispatch(inputs[1], "change");
    assert_eq!(mounted.state("done"), Some(json!(true)));

    mounted.set_state("name", json!("Grace")).unwrap();
    assert_eq!(doc.property(inputs[0], "value"), Some(json!("Grace")));
}

#[test]
fn test_navigation_link() {
    let (runtime, doc, _) = setup();
    let nav = program("---\na[!nav(/about) \"About\"]", "Nav");
    Renderer::new(runtime.clone(), doc.clone())
        .mount(&nav, doc.root())
        .unwrap();
    assert_eq!(doc.to_html(doc.root()), r#"<a href="/about">About</a>"#);

    let cancelled = !doc.dispatch(doc.query("a").unwrap(), "click");
    assert!(cancelled);
    assert_eq!(doc.navigations(), ["/about"]);
}

#[test]
fn test_standing_effect_respects_guards() {
    let (runtime, doc, _) = setup();
    let watcher = program(
        "$count:0\n$seen:0\n~ $count > 1 |> $seen = $count\n---\np[$seen]",
        "Watcher",
    );
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .mount(&watcher, doc.root())
        .unwrap();
    mounted.set_state("count", json!(1)).unwrap();
    assert_eq!(doc.to_html(doc.root()), "<p>0</p>");
    mounted.set_state("count", json!(5)).unwrap();
    assert_eq!(doc.to_html(doc.root()), "<p>5</p>");
}

#[test]
fn test_fetch_fills_target() {
    let (runtime, doc, errors) = setup();
    let users = program(
        "$users:[]\n~ fetch(\"/api/users\") |> json |> .data |> $users\n---\nul\n  $users\n    li[:name]",
        "Users",
    );
    let fetcher = StaticFetcher::new().json(
        "/api/users",
        &json!({"data": [{"name": "Ada"}, {"name": "Grace"}]}),
    );
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(Rc::new(fetcher))
        .mount(&users, doc.root())
        .unwrap();
    assert_eq!(
        doc.to_html(doc.root()),
        "<ul><li>Ada</li><li>Grace</li></ul>"
    );
    assert_eq!(mounted.state("users").unwrap()[1]["name"], json!("Grace"));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_fetch_failure_is_reported() {
    let (runtime, doc, errors) = setup();
    let users = program(
        "$users:[]\n~ fetch(\"/api/users\") |> json |> $users\n---\np[\"@{$users.length}\"]",
        "Users",
    );
    Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(Rc::new(StaticFetcher::new()))
        .mount(&users, doc.root())
        .unwrap();
    assert_eq!(*errors.borrow(), ["async task failed: HTTP 404"]);
    assert_eq!(doc.to_html(doc.root()), "<p>0</p>");
}

#[test]
fn test_latest_fetch_wins() {
    let (runtime, doc, errors) = setup();
    let race = program(
        "$data:\"none\"\n~ fetch(\"/slow\") |> text |> $data\n~ fetch(\"/fast\") |> text |> $data\n---\np[$data]",
        "Race",
    );
    let fetcher = Rc::new(DeferredFetcher::new());
    let shared: Rc<dyn Fetcher> = fetcher.clone();
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(shared)
        .mount(&race, doc.root())
        .unwrap();
    assert_eq!(fetcher.pending(), ["/slow", "/fast"]);

    assert!(fetcher.resolve("/fast", Ok(FetchResponse::ok("fast"))));
    assert!(fetcher.resolve("/slow", Ok(FetchResponse::ok("slow"))));
    assert_eq!(mounted.state("data"), Some(json!("fast")));
    assert_eq!(doc.to_html(doc.root()), "<p>fast</p>");
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_failed_newer_fetch_keeps_older_value() {
    let (runtime, doc, errors) = setup();
    let race = program(
        "$data:\"none\"\n~ fetch(\"/old\") |> text |> $data\n~ fetch(\"/new\") |> text |> $data\n---\np[$data]",
        "Race",
    );
    let fetcher = Rc::new(DeferredFetcher::new());
    let shared: Rc<dyn Fetcher> = fetcher.clone();
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(shared)
        .mount(&race, doc.root())
        .unwrap();

    let missing = FetchResponse {
        status: 404,
        body: String::new(),
    };
    assert!(fetcher.resolve("/new", Ok(missing)));
    assert!(fetcher.resolve("/old", Ok(FetchResponse::ok("old"))));
    assert_eq!(mounted.state("data"), Some(json!("old")));
    assert_eq!(*errors.borrow(), ["async task failed: HTTP 404"]);
}

#[test]
fn test_unmount_releases_everything() {
    let (runtime, doc, _) = setup();
    let page = program(
        "$data:\"\"\n$size := $data.length\n~ fetch(\"/page\") |> text |> $data\n---\np[$data]\np[$size]",
        "Page",
    );
    let fetcher = Rc::new(DeferredFetcher::new());
    let shared: Rc<dyn Fetcher> = fetcher.clone();
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(shared)
        .mount(&page, doc.root())
        .unwrap();
    assert!(runtime.effect_count() > 0);

    mounted.unmount();
    assert_eq!(runtime.effect_count(), 0);
    assert_eq!(doc.to_html(doc.root()), "");

    // A response arriving after unmount is dropped
    assert!(fetcher.resolve("/page", Ok(FetchResponse::ok("late"))));
    assert_eq!(doc.to_html(doc.root()), "");
}

#[test]
fn test_components() {
    let (runtime, doc, _) = setup();
    let mut renderer = Renderer::new(runtime.clone(), doc.clone());
    renderer.register(program("$label:\"Hi\"\n---\nh1[$label]", "title"));
    let app = program("---\nheader\n  ::Title\n::Title\np[\"body\"]", "App");

    renderer.mount(&app, doc.root()).unwrap();
    assert_eq!(
        doc.to_html(doc.root()),
        "<header><h1>Hi</h1></header><h1>Hi</h1><p>body</p>"
    );
}

#[test]
fn test_component_errors() {
    let (runtime, doc, _) = setup();
    let mut renderer = Renderer::new(runtime.clone(), doc.clone());
    let app = program("---\n::Missing", "App");
    assert_eq!(
        renderer.mount(&app, doc.root()).err(),
        Some(MountError::UnknownComponent("Missing".into()))
    );

    renderer.register(program("---\ndiv\n  ::Echo", "Echo"));
    let echo = program("---\n::Echo", "Shell");
    assert_eq!(
        renderer.mount(&echo, doc.root()).err(),
        Some(MountError::RecursiveComponent("Echo".into()))
    );
    assert_eq!(doc.to_html(doc.root()), "");
}

#[test]
fn test_handler_errors_are_reported() {
    let (runtime, doc, errors) = setup();
    let broken = program("$user:null\n---\nbutton[!click($user.name = 1) \"x\"]", "Broken");
    Renderer::new(runtime.clone(), doc.clone())
        .mount(&broken, doc.root())
        .unwrap();
    doc.dispatch(doc.query("button").unwrap(), "click");
    assert_eq!(
        *errors.borrow(),
        ["`click` handler failed: cannot write `name` on null"]
    );
}

#[test]
fn test_todo_app() {
    let (runtime, doc, errors) = setup();
    let todo = program(
        r#"
$items:[]
$draft:""
$remaining := $items.length
~ fetch("/api/todos") |> json |> .todos |> $items
---
section
  h1["Todos: @{$remaining}"]
  input[$draft placeholder{"New todo"}]
  button[!click($items.push($draft)) "Add"]
  ul
    $items
      li[:value]
  ? $remaining === 0
    p["Nothing to do"]
  ? else
    p["Keep going"]
"#,
        "TodoApp",
    );
    let fetcher = StaticFetcher::new().json("/api/todos", &json!({"todos": ["Write", "Test"]}));
    let mounted = Renderer::new(runtime.clone(), doc.clone())
        .with_fetcher(Rc::new(fetcher))
        .mount(&todo, doc.root())
        .unwrap();
    insta::assert_snapshot!(
        doc.to_html(doc.root()),
        @r#"<section><h1>Todos: 2</h1><input placeholder="New todo"><button>Add</button><ul><li>Write</li><li>Test</li></ul><p>Keep going</p></section>"#
    );

    let input = doc.query("input").unwrap();
    doc.set_property(input, "value", json!("Ship"));
    doc.dispatch(input, "input");
    doc.dispatch(doc.query("button").unwrap(), "click");
    assert_eq!(doc.text_content(doc.query("h1").unwrap()), "Todos: 3");
    assert_eq!(doc.text_content(doc.query("ul").unwrap()), "WriteTestShip");

    mounted.set_state("items", json!([])).unwrap();
    assert_eq!(doc.text_content(doc.query("h1").unwrap()), "Todos: 0");
    assert_eq!(doc.query_all(doc.root(), "p").len(), 1);
    assert_eq!(doc.text_content(doc.query("p").unwrap()), "Nothing to do");
    assert!(errors.borrow().is_empty());
}
