//! RESTx CLI
//!
//! Browses a RESTx server, creates resources and invokes their services.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use indexmap::IndexMap;
use restx_client::{Client, RemoteComponent, RemoteResource};
use restx_core::{HttpMethod, ParameterDefinition, Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restx")]
#[command(about = "RESTx - schema-driven client for RESTx servers", long_about = None)]
struct Cli {
    /// Server URI
    #[arg(short, long, global = true, env = "RESTX_SERVER", default_value = "http://localhost:8001")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server name and version
    Info,
    /// List components
    Components,
    /// Show a component's schema
    Component {
        /// Component name
        name: String,
    },
    /// List resources
    Resources,
    /// Show a resource and its services
    Resource {
        /// Resource name
        name: String,
    },
    /// Invoke a service of a resource
    Invoke {
        /// Resource name
        resource: String,
        /// Service name
        service: String,
        /// Parameter value as name=value
        #[arg(short = 'p', long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
        /// Request body (JSON)
        #[arg(short, long)]
        body: Option<String>,
        /// Request method
        #[arg(short, long)]
        method: Option<HttpMethod>,
        /// Required response status
        #[arg(short, long)]
        expect: Option<u16>,
    },
    /// Create a resource from a component
    Create {
        /// Component name
        component: String,
        /// Suggested resource name
        #[arg(short, long)]
        name: String,
        /// Resource description
        #[arg(short, long)]
        desc: Option<String>,
        /// Parameter value as name=value
        #[arg(short = 'p', long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{s}'")),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_params(title: &str, params: &IndexMap<String, ParameterDefinition>) {
    if params.is_empty() {
        return;
    }
    println!("  {title}:");
    for p in params.values() {
        let requirement = match p.default_value() {
            Some(default) => format!("default {}", json::render(default)),
            None => "required".to_string(),
        };
        println!(
            "    {} ({}, {requirement}) {}",
            p.name(),
            p.param_type().token(),
            p.description()
        );
    }
}

fn show_component(component: &RemoteComponent) {
    println!("{} ({})", component.name(), component.uri());
    println!("  {}", component.description());
    print_params("parameters", component.parameters());
    print_params(
        "resource creation parameters",
        component.descriptor().resource_creation_params(),
    );
    for service in component.services().values() {
        println!("  service {}: {}", service.name(), service.description());
        print_params("parameters", service.parameters());
        if !service.positional().is_empty() {
            println!("    positional: {}", service.positional().join(", "));
        }
    }
}

fn show_resource(resource: &RemoteResource) -> Result<()> {
    println!("{} ({})", resource.name(), resource.uri());
    println!("  {}", resource.description());
    for name in resource.service_names() {
        let service = resource.service_definition(&name)?;
        println!("  service {name}: {}", service.description());
        print_params("parameters", service.parameters());
    }
    Ok(())
}

fn run(client: &Client, server: &str, command: Commands) -> Result<()> {
    match command {
        Commands::Info => {
            println!("{} {}", client.server_name()?, client.server_version()?);
            println!("{server}");
        }
        Commands::Components => {
            for (name, entry) in client.components()? {
                println!("{name}\t{}\t{}", entry.uri, entry.desc);
            }
        }
        Commands::Component { name } => show_component(&client.component(&name)?),
        Commands::Resources => {
            for (name, entry) in client.resources()? {
                println!("{name}\t{}\t{}", entry.uri, entry.desc);
            }
        }
        Commands::Resource { name } => show_resource(&client.resource(&name)?)?,
        Commands::Invoke {
            resource,
            service,
            params,
            body,
            method,
            expect,
        } => {
            let mut bound = client.resource(&resource)?.service(&service)?;
            for (name, value) in params {
                bound = bound.set(&name, value)?;
            }
            if let Some(body) = body {
                let parsed = json::from_text(&body).wrap_err("request body is not JSON")?;
                bound = bound.input(parsed);
            }
            if let Some(method) = method {
                bound = bound.method(method);
            }
            if let Some(status) = expect {
                bound = bound.expect(status);
            }
            let response = bound.access()?;
            tracing::debug!(status = response.status, "service replied");
            print_json(&response.body)?;
        }
        Commands::Create {
            component,
            name,
            desc,
            params,
        } => {
            let mut template = client.component(&component)?.resource_template().suggested_name(name);
            if let Some(desc) = desc {
                template = template.description(desc);
            }
            for (name, value) in params {
                template = template.set(&name, value)?;
            }
            let resource = template.create()?;
            println!("created {} at {}", resource.name(), resource.uri());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = Client::connect(&cli.server)
        .wrap_err_with(|| format!("connecting to {}", cli.server))?;
    run(&client, &cli.server, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("num=5"), Ok(("num".into(), "5".into())));
        assert_eq!(parse_pair("q=a=b"), Ok(("q".into(), "a=b".into())));
        assert_eq!(parse_pair("empty="), Ok(("empty".into(), String::new())));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn test_invoke_arguments() {
        let cli = Cli::try_parse_from([
            "restx", "--server", "http://h:1", "invoke", "MyRes", "foobar", "-p", "num=3",
            "--param", "query=x", "--method", "put", "--expect", "200",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://h:1");
        match cli.command {
            Commands::Invoke {
                resource,
                service,
                params,
                method,
                expect,
                body,
            } => {
                assert_eq!(resource, "MyRes");
                assert_eq!(service, "foobar");
                assert_eq!(params[1], ("query".to_string(), "x".to_string()));
                assert_eq!(method, Some(HttpMethod::Put));
                assert_eq!(expect, Some(200));
                assert!(body.is_none());
            }
            _ => panic!("expected invoke"),
        }
    }

    #[test]
    fn test_create_requires_name() {
        assert!(Cli::try_parse_from(["restx", "create", "SampleComponent"]).is_err());
    }
}
