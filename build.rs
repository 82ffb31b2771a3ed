//! Build script for minifying the embedded sandbox runtime scripts.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    minify_js_file(
        "src/embed/runtime/react-shim.js",
        &out_path.join("react-shim.min.js"),
    );
    minify_js_file("src/embed/runtime/host.js", &out_path.join("host.min.js"));

    println!("cargo:rerun-if-changed=src/embed/runtime/react-shim.js");
    println!("cargo:rerun-if-changed=src/embed/runtime/host.js");
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_js_file(input: &str, output: &Path) {
    let source = fs::read_to_string(input).expect("Failed to read JS file");
    let minified = minify_js(&source);
    fs::write(output, minified).expect("Failed to write minified JS");
}
