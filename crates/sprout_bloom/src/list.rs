//! The list helper.
//!
//! Renders a collection into a region and rebuilds the whole region every
//! time the source changes. There is no keyed reconciliation: every item
//! node is dropped and recreated, and effects created by the previous
//! build are disposed with it.

use std::rc::Rc;

use sprout_sap::{Computed, EffectError, Runtime, Signal};

use crate::host::{Host, NodeId};

/// Where a list reads its items from.
pub enum ListSource<T: 'static> {
    Signal(Signal<Vec<T>>),
    Computed(Computed<Vec<T>>),
    /// Re-evaluated on every rebuild; reads inside are tracked
    Derived(Box<dyn Fn() -> Result<Vec<T>, EffectError>>),
}

impl<T: Clone + 'static> ListSource<T> {
    fn read(&self) -> Result<Vec<T>, EffectError> {
        match self {
            Self::Signal(signal) => Ok(signal.get()),
            Self::Computed(computed) => Ok(computed.get()),
            Self::Derived(derive) => derive(),
        }
    }
}

/// Render `source` into a new region. `template` builds the nodes for one
/// item given the item and its index.
///
/// Returns the region; the caller attaches it.
pub fn render_list<T, F>(
    runtime: &Runtime,
    host: &Rc<dyn Host>,
    source: ListSource<T>,
    template: F,
) -> NodeId
where
    T: Clone + 'static,
    F: Fn(&T, usize) -> Result<Vec<NodeId>, EffectError> + 'static,
{
    let region = host.create_region();
    let host = Rc::clone(host);
    let weak = runtime.downgrade();

    runtime.effect(move || {
        let items = source.read()?;
        let build = || -> Result<(), EffectError> {
            host.clear(region);
            for (index, item) in items.iter().enumerate() {
                for node in template(item, index)? {
                    host.append(region, node);
                }
            }
            Ok(())
        };
        tracing::trace!(%region, items = items.len(), "rebuilding list");
        // Only the source is a dependency of the list
        match weak.upgrade() {
            Some(runtime) => runtime.untrack(build),
            None => build(),
        }
    });

    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn text_item(doc: &Rc<Document>) -> impl Fn(&String, usize) -> Result<Vec<NodeId>, EffectError> {
        let doc = Rc::clone(doc);
        move |item: &String, index: usize| {
            let li = doc.create_element("li");
            let text = doc.create_text(&format!("{index}:{item}"));
            doc.append(li, text);
            Ok(vec![li])
        }
    }

    #[test]
    fn test_full_rebuild() {
        let runtime = Runtime::new();
        let doc = Rc::new(Document::new());
        let host: Rc<dyn Host> = doc.clone();
        let items = runtime.signal(vec!["a".to_string(), "b".to_string()]);

        let region = render_list(
            &runtime,
            &host,
            ListSource::Signal(items.clone()),
            text_item(&doc),
        );
        doc.append(doc.root(), region);
        assert_eq!(doc.to_html(doc.root()), "<li>0:a</li><li>1:b</li>");
        let first = doc.children(region)[0];

        items.update(|items| items.push("c".to_string()));
        assert_eq!(doc.to_html(doc.root()), "<li>0:a</li><li>1:b</li><li>2:c</li>");
        // Unchanged items are recreated too
        assert!(!doc.contains(first));
        assert_ne!(doc.children(region)[0], first);
    }

    #[test]
    fn test_derived_source_tracks_only_source() {
        let runtime = Runtime::new();
        let doc = Rc::new(Document::new());
        let host: Rc<dyn Host> = doc.clone();
        let limit = runtime.signal(1usize);
        let other = runtime.signal(0);
        let builds = Rc::new(std::cell::Cell::new(0));

        let source_limit = limit.clone();
        let template_other = other.clone();
        let counter = builds.clone();
        let template_doc = doc.clone();
        let region = render_list(
            &runtime,
            &host,
            ListSource::Derived(Box::new(move || -> Result<Vec<usize>, EffectError> {
                Ok((0..source_limit.get()).collect::<Vec<usize>>())
            })),
            move |item: &usize, _: usize| {
                counter.set(counter.get() + 1);
                // Read inside the template: must not subscribe the list
                let _ = template_other.get();
                Ok(vec![template_doc.create_text(&item.to_string())])
            },
        );
        doc.append(doc.root(), region);
        assert_eq!(builds.get(), 1);

        limit.set(3);
        assert_eq!(doc.text_content(region), "012");
        assert_eq!(builds.get(), 4);

        other.set(5);
        assert_eq!(builds.get(), 4);
    }

    #[test]
    fn test_template_error_is_reported() {
        let runtime = Runtime::new();
        let errors = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = errors.clone();
        runtime.on_error(move |error| sink.borrow_mut().push(error.to_string()));

        let doc = Rc::new(Document::new());
        let host: Rc<dyn Host> = doc.clone();
        let items = runtime.signal(vec![1, 2]);
        render_list(&runtime, &host, ListSource::Signal(items), |_: &i32, _| {
            Err(EffectError::new("bad item"))
        });
        assert_eq!(errors.borrow().len(), 1);
        assert!(errors.borrow()[0].ends_with("bad item"));
    }
}
