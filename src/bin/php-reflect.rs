use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use php_reflect::Configuration;
use php_reflect::reflection::{
    FunctionReflection, ReflectionClass, ReflectionConstant, ReflectionParameter,
};
use php_reflect::source_locator::SourceLocator;
use serde_json::{Map, Value as Json, json};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "php-reflect")]
#[command(about = "Reflect PHP declarations without running them", long_about = None)]
struct Cli {
    /// PHP file to search (repeatable)
    #[arg(long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory to scan recursively for .php files (repeatable)
    #[arg(long = "dir", value_name = "DIR")]
    dirs: Vec<PathBuf>,

    /// Project directory containing composer.json
    #[arg(long, value_name = "DIR")]
    composer: Option<PathBuf>,

    /// PSR-4 mapping such as `App\=src` (repeatable)
    #[arg(long = "psr4", value_name = "PREFIX=DIR")]
    psr4: Vec<String>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Describe a class, interface, trait or enum
    Class { name: String },
    /// Describe a function
    Function { name: String },
    /// Show the value of a constant
    Constant { name: String },
    /// Describe the closure or arrow function starting on a line of a file
    Closure { file: PathBuf, line: usize },
    /// List every symbol of a kind visible through the sources
    List {
        #[arg(value_enum)]
        kind: ListKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    Classes,
    Functions,
    Constants,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Configuration::default();
    let locators = build_locators(&config, &cli)?;
    let reflector = config.reflector_for(locators);

    let output = match &cli.command {
        Command::Class { name } => {
            let class = reflector
                .reflect_class(name)
                .with_context(|| format!("reflecting class {name}"))?;
            describe_class(&class)?
        }
        Command::Function { name } => {
            let function = reflector
                .reflect_function(name)
                .with_context(|| format!("reflecting function {name}"))?;
            describe_function(&function.into())
        }
        Command::Constant { name } => {
            let constant = reflector
                .reflect_constant(name)
                .with_context(|| format!("reflecting constant {name}"))?;
            describe_constant(&constant)
        }
        Command::Closure { file, line } => {
            let closure = config
                .reflector(config.closure_in_file(file, *line)?)
                .reflect_closure()
                .with_context(|| format!("reflecting closure at {}:{line}", file.display()))?;
            describe_function(&closure.into())
        }
        Command::List { kind } => {
            let names: Vec<String> = match kind {
                ListKind::Classes => reflector
                    .reflect_all_classes()?
                    .iter()
                    .map(ReflectionClass::name)
                    .collect(),
                ListKind::Functions => reflector
                    .reflect_all_functions()?
                    .iter()
                    .map(|function| function.name().to_string())
                    .collect(),
                ListKind::Constants => reflector
                    .reflect_all_constants()?
                    .iter()
                    .map(|constant| constant.name().to_string())
                    .collect(),
            };
            json!(names)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "php_reflect=debug",
        _ => "php_reflect=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_locators(config: &Configuration, cli: &Cli) -> anyhow::Result<Vec<Rc<dyn SourceLocator>>> {
    let mut locators = Vec::new();
    for file in &cli.files {
        locators.push(config.single_file(file)?);
    }
    if !cli.dirs.is_empty() {
        locators.push(config.directories(cli.dirs.iter().cloned())?);
    }
    if let Some(project) = &cli.composer {
        locators.push(config.composer_project(project)?);
    }
    if !cli.psr4.is_empty() {
        let mut mappings = Vec::new();
        for mapping in &cli.psr4 {
            let Some((prefix, dir)) = mapping.split_once('=') else {
                bail!("invalid --psr4 mapping \"{mapping}\", expected PREFIX=DIR");
            };
            mappings.push((prefix.to_string(), vec![PathBuf::from(dir)]));
        }
        locators.push(config.psr4(mappings)?);
    }
    Ok(locators)
}

fn describe_class(class: &ReflectionClass) -> anyhow::Result<Json> {
    let mut constants = Map::new();
    for (name, constant) in class.constants()? {
        constants.insert(name, serde_json::to_value(constant.value()?)?);
    }

    let mut properties = Vec::new();
    for (name, property) in class.properties()? {
        let default = if property.has_default_value() {
            serde_json::to_value(property.default_value()?)?
        } else {
            Json::Null
        };
        properties.push(json!({
            "name": name,
            "visibility": format!("{:?}", property.visibility()).to_lowercase(),
            "static": property.is_static(),
            "readonly": property.is_readonly(),
            "type": property.type_declaration().map(ToString::to_string),
            "default": default,
        }));
    }

    let methods: Vec<Json> = class
        .methods()?
        .into_values()
        .map(|method| describe_function(&method.into()))
        .collect();

    let mut cases = Map::new();
    for case in class.cases() {
        let value = match case.backing_value()? {
            Some(value) => serde_json::to_value(value)?,
            None => Json::Null,
        };
        cases.insert(case.name().to_string(), value);
    }

    Ok(json!({
        "name": class.name(),
        "kind": format!("{:?}", class.kind()).to_lowercase(),
        "file": class.file_name(),
        "lines": [class.start_line(), class.end_line()],
        "internal": class.is_internal(),
        "extension": class.extension_name(),
        "abstract": class.is_abstract(),
        "final": class.is_final(),
        "parent": class.parent_class_name(),
        "interfaces": class.interface_names()?,
        "traits": class.trait_names(),
        "constants": constants,
        "cases": cases,
        "properties": properties,
        "methods": methods,
    }))
}

fn describe_parameter(param: &ReflectionParameter) -> Json {
    let default = match param.default_value() {
        Ok(value) if param.is_default_value_available() => {
            serde_json::to_value(value).unwrap_or(Json::Null)
        }
        Ok(_) => Json::Null,
        Err(err) => json!({ "error": err.to_string() }),
    };
    json!({
        "name": param.name(),
        "position": param.position(),
        "type": param.type_declaration().map(ToString::to_string),
        "optional": param.is_optional(),
        "variadic": param.is_variadic(),
        "by_ref": param.is_passed_by_reference(),
        "default": default,
    })
}

fn describe_function(function: &FunctionReflection) -> Json {
    let parameters: Vec<Json> = function.parameters().iter().map(describe_parameter).collect();
    json!({
        "name": function.name(),
        "class": function.class().map(ReflectionClass::name),
        "file": function.file_name(),
        "lines": [function.start_line(), function.end_line()],
        "return_type": function.return_type().map(ToString::to_string),
        "by_ref": function.returns_reference(),
        "parameters": parameters,
    })
}

fn describe_constant(constant: &ReflectionConstant) -> Json {
    let value = match constant.value() {
        Ok(value) => serde_json::to_value(value).unwrap_or(Json::Null),
        Err(err) => json!({ "error": err.to_string() }),
    };
    json!({
        "name": constant.name(),
        "namespace": constant.namespace_name(),
        "file": constant.file_name(),
        "lines": [constant.start_line(), constant.end_line()],
        "internal": constant.is_internal(),
        "define": constant.is_defined_by_define(),
        "value": value,
    })
}
