use feed_tree::config::DEFAULT_LOG_FILTER;
use feed_tree::{
    Feed, InstanceStatus, PluginInstance, classify_unreachable, load_feed_from_csv,
    load_feed_from_json, render_instance_table, render_tree, save_feed_to_csv, save_feed_to_json,
};
use std::io::{self, Write};
use tracing_subscriber::{EnvFilter, fmt};

fn install_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show instances as a table\n  tree                               Show the feed tree\n  layout                             Print the tree layout as JSON\n  add <id> <plugin> [previous_id]    Upsert an instance (no previous_id = feed root)\n  status <id> <status>               Set status (e.g. started, finishedSuccessfully)\n  title <id> <text...>               Set title (rest of line)\n  delete <id>                        Delete an instance and its descendants\n  progress                           Summarise instance statuses\n  meta show                          Show feed metadata\n  meta name <text...>                Update feed name\n  meta owner <text>                  Update feed owner\n  save <json|csv> <path>             Persist feed to disk\n  load <json|csv> <path>             Load feed from disk\n  quit|exit                          Exit"
    );
}

fn print_metadata(feed: &Feed) {
    let metadata = feed.metadata();
    println!("Feed name          : {}", metadata.name);
    println!("Feed owner         : {}", metadata.owner);
    println!("Created            : {}", metadata.creation_date);
}

fn print_tree(feed: &Feed) {
    let build = feed.layout();
    if build.layout.is_empty() {
        println!("(empty tree)");
    } else {
        print!("{}", render_tree(&build.layout));
    }
    let report = classify_unreachable(feed.instances(), &build.unreachable);
    if !report.orphans.is_empty() {
        println!("Orphaned instances : {:?}", report.orphans);
    }
    if !report.cyclic.is_empty() {
        println!("Cyclic instances   : {:?}", report.cyclic);
    }
}

fn parse_id(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.parse::<i32>().ok())
}

/// Everything after the first `skip` words of `input`, trimmed.
fn rest_of_line(input: &str, skip: usize) -> &str {
    let mut rest = input.trim_start();
    for _ in 0..skip {
        rest = match rest.find(char::is_whitespace) {
            Some(pos) => rest[pos..].trim_start(),
            None => "",
        };
    }
    rest.trim_end()
}

fn main() {
    install_tracing();
    let mut feed = Feed::new();

    println!("Feed Tree (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print!("{}", render_instance_table(feed.instances())),
            "tree" => print_tree(&feed),
            "layout" => {
                let build = feed.layout();
                match serde_json::to_string_pretty(&build) {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("Error rendering layout: {e}"),
                }
            }
            "add" => {
                let id = parts.next();
                let plugin = parts.next();
                let previous = parts.next();
                match (parse_id(id), plugin) {
                    (Some(id), Some(plugin)) => {
                        let instance = match previous {
                            Some(previous_s) => match previous_s.parse::<i32>() {
                                Ok(previous) => PluginInstance::child_of(id, previous, plugin),
                                Err(_) => {
                                    println!("Invalid previous_id");
                                    continue;
                                }
                            },
                            None => PluginInstance::root(id, plugin),
                        };
                        match feed.upsert_instance(instance) {
                            Ok(()) => println!("Instance {id} upserted."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: add <id> <plugin> [previous_id]"),
                }
            }
            "status" => {
                let id = parse_id(parts.next());
                let status = parts.next().map(str::parse::<InstanceStatus>);
                match (id, status) {
                    (Some(id), Some(Ok(status))) => match feed.set_status(id, status) {
                        Ok(()) => println!("Instance {id} is now {status}."),
                        Err(e) => println!("Error: {e}"),
                    },
                    (Some(_), Some(Err(e))) => println!("Error: {e}"),
                    _ => println!("Usage: status <id> <status>"),
                }
            }
            "title" => {
                let id = parse_id(parts.next());
                let title = rest_of_line(input, 2);
                match id {
                    Some(id) if !title.is_empty() => match feed.set_title(id, title) {
                        Ok(()) => println!("Instance {id} titled '{title}'."),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: title <id> <text...>"),
                }
            }
            "delete" => match parse_id(parts.next()) {
                Some(id) => {
                    let removed = feed.delete_instance(id);
                    if removed.is_empty() {
                        println!("Instance {id} not found.");
                    } else {
                        println!("Deleted instances {removed:?}.");
                    }
                }
                None => println!("Usage: delete <id>"),
            },
            "progress" => println!("{}", feed.progress().to_cli_summary()),
            "meta" => match parts.next() {
                Some("show") => print_metadata(&feed),
                Some("name") => {
                    let name = rest_of_line(input, 2);
                    match feed.set_name(name) {
                        Ok(()) => println!("Feed name updated."),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                Some("owner") => match parts.next() {
                    Some(owner) => {
                        feed.set_owner(owner);
                        println!("Feed owner updated.");
                    }
                    None => println!("Usage: meta owner <text>"),
                },
                _ => println!("Usage: meta <show|name|owner> ..."),
            },
            "save" => {
                let format = parts.next();
                let path = parts.next();
                let result = match (format, path) {
                    (Some("json"), Some(path)) => Some(save_feed_to_json(&feed, path)),
                    (Some("csv"), Some(path)) => Some(save_feed_to_csv(&feed, path)),
                    _ => None,
                };
                match (result, path) {
                    (Some(Ok(())), Some(path)) => println!("Feed saved to {path}."),
                    (Some(Err(e)), _) => println!("Error saving feed: {e}"),
                    _ => println!("Usage: save <json|csv> <path>"),
                }
            }
            "load" => {
                let format = parts.next();
                let path = parts.next();
                let result = match (format, path) {
                    (Some("json"), Some(path)) => Some(load_feed_from_json(path)),
                    (Some("csv"), Some(path)) => Some(load_feed_from_csv(path)),
                    _ => None,
                };
                match (result, path) {
                    (Some(Ok(loaded)), Some(path)) => {
                        feed = loaded;
                        println!("Feed loaded from {path}.");
                    }
                    (Some(Err(e)), _) => println!("Error loading feed: {e}"),
                    _ => println!("Usage: load <json|csv> <path>"),
                }
            }
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }
}
