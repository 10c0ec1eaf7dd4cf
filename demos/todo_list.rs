//! A todo list with a connected counter and a connected title

use tether::{connect, record, Component, Projection, Provider, Record, Store, Value, View};

fn todos(state: &Record) -> Vec<Value> {
    state
        .get("todos")
        .and_then(Value::as_list)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

fn main() -> tether::Result<()> {
    println!("=== Connect Example ===\n");

    let store = Store::new(record! {
        "todos" => Vec::<Value>::new(),
        "filter" => "all",
    });

    let counter = Component::stateless("ActiveCount", |props| {
        View::text(format!("{} active", props.get("active").unwrap_or(&Value::Null)))
    });
    let title = Component::stateless("Title", |props| {
        let title = props.get("title").unwrap_or(&Value::Null);
        let filter = props.get("filter").unwrap_or(&Value::Null);
        View::text(format!("{title} ({filter})"))
    });

    let active_count = connect(Some(Projection::state_only(|state| {
        let active = todos(state)
            .iter()
            .filter_map(Value::as_record)
            .filter(|todo| todo.get("completed").and_then(Value::as_bool) == Some(false))
            .count();
        record! { "active" => active }
    })))
    .bind(counter);

    let filtered_title = connect(Some(Projection::with_own_props(|state, _own| {
        record! { "filter" => state.get("filter").cloned().unwrap_or_default() }
    })))
    .bind(title);

    let (count_view, title_view) = Provider::new(store.clone()).scope(|| {
        Ok::<_, tether::Error>((
            active_count.mount(Record::new())?,
            filtered_title.mount(record! { "title" => "Todos" })?,
        ))
    })?;

    count_view.on_redraw(|view| println!("counter redrawn: {}", view.text_content()));
    title_view.on_redraw(|view| println!("title redrawn: {}", view.text_content()));

    println!("{}", count_view.text_content());
    println!("{}", title_view.text_content());

    println!("\nAdding todo...");
    let mut list = todos(&store.get_state());
    list.push(Value::from(record! {
        "id" => 1,
        "text" => "Learn tether",
        "completed" => false,
    }));
    store.set_state(record! { "todos" => list })?;

    println!("\nChanging filter (counter should stay quiet)...");
    store.set_state(record! { "filter" => "active" })?;

    println!("\nCompleting todo...");
    let list: Vec<Value> = todos(&store.get_state())
        .iter()
        .filter_map(Value::as_record)
        .map(|todo| Value::from(todo.clone().with("completed", true)))
        .collect();
    store.set_state(record! { "todos" => list })?;

    println!("\nFinal state: {:#?}", store.get_state());
    Ok(())
}
