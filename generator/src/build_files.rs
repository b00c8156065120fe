// build_files.rs — Makefile and build script templates
//
// Produces a GNU makefile that builds the model sources into `<model>.so`,
// and a Windows batch script that puts the cross toolchain on PATH and runs
// make with it. Both are plain templates over the model name and
// `BuildOptions`; they are never whitespace-normalized (make recipes need
// literal tabs).
//
// Preconditions: `model.name` is a valid identifier.
// Postconditions: returns deterministic text for identical inputs.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::model::ModelDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub c_std: String,
    pub cxx_std: String,
    pub include_dirs: Vec<String>,
    pub src_dir: String,
    /// Toolchain root used by the build script; `None` leaves it to the
    /// `TOOLCHAIN` environment variable.
    pub toolchain_dir: Option<String>,
    pub toolchain_prefix: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            c_std: "gnu11".to_string(),
            cxx_std: "gnu++17".to_string(),
            include_dirs: Vec::new(),
            src_dir: "src".to_string(),
            toolchain_dir: None,
            toolchain_prefix: "x86_64-nilrt-linux-".to_string(),
        }
    }
}

/// Shared library the makefile links.
pub fn target_name(model: &ModelDescriptor) -> String {
    format!("{}.so", model.name)
}

pub fn makefile(model: &ModelDescriptor, options: &BuildOptions) -> String {
    let mut out = String::with_capacity(2048);
    let _ = writeln!(out, "# Makefile for the {} VeriStand model", model.name);
    out.push_str("# Generated by vsmodelgen\n");
    out.push('\n');
    let _ = writeln!(out, "TARGET := {}", target_name(model));
    let _ = writeln!(out, "SRCDIR := {}", options.src_dir);
    out.push_str("BUILDDIR := build\n");
    out.push('\n');
    let _ = writeln!(out, "CC ?= {}gcc", options.toolchain_prefix);
    let _ = writeln!(out, "CXX ?= {}g++", options.toolchain_prefix);
    let _ = writeln!(out, "CSTD := {}", options.c_std);
    let _ = writeln!(out, "CXXSTD := {}", options.cxx_std);
    out.push('\n');
    out.push_str("INCLUDES := -I$(SRCDIR)");
    for dir in &options.include_dirs {
        let _ = write!(out, " -I{}", dir);
    }
    out.push('\n');
    out.push_str("CFLAGS := -std=$(CSTD) -fPIC -O2 -Wall $(INCLUDES)\n");
    out.push_str("CXXFLAGS := -std=$(CXXSTD) -fPIC -O2 -Wall $(INCLUDES)\n");
    out.push_str("LDFLAGS := -shared\n");
    out.push('\n');
    out.push_str("CSRCS := $(wildcard $(SRCDIR)/*.c)\n");
    out.push_str("CXXSRCS := $(wildcard $(SRCDIR)/*.cpp)\n");
    out.push_str("OBJS := $(CSRCS:$(SRCDIR)/%.c=$(BUILDDIR)/%.o) $(CXXSRCS:$(SRCDIR)/%.cpp=$(BUILDDIR)/%.o)\n");
    out.push('\n');
    out.push_str(".PHONY: all clean\n");
    out.push('\n');
    out.push_str("all: $(TARGET)\n");
    out.push('\n');
    out.push_str("$(TARGET): $(OBJS)\n");
    out.push_str("\t$(CXX) $(LDFLAGS) -o $@ $^\n");
    out.push('\n');
    out.push_str("$(BUILDDIR)/%.o: $(SRCDIR)/%.c | $(BUILDDIR)\n");
    out.push_str("\t$(CC) $(CFLAGS) -c -o $@ $<\n");
    out.push('\n');
    out.push_str("$(BUILDDIR)/%.o: $(SRCDIR)/%.cpp | $(BUILDDIR)\n");
    out.push_str("\t$(CXX) $(CXXFLAGS) -c -o $@ $<\n");
    out.push('\n');
    out.push_str("$(BUILDDIR):\n");
    out.push_str("\tmkdir -p $@\n");
    out.push('\n');
    out.push_str("clean:\n");
    out.push_str("\trm -rf $(BUILDDIR) $(TARGET)\n");
    out
}

/// Batch script with CRLF line endings.
pub fn build_script(model: &ModelDescriptor, options: &BuildOptions) -> String {
    let mut lines: Vec<String> = vec![
        "@echo off".to_string(),
        format!("rem Build script for the {} VeriStand model", model.name),
        "rem Generated by vsmodelgen".to_string(),
        String::new(),
        "setlocal".to_string(),
    ];
    match &options.toolchain_dir {
        Some(dir) => lines.push(format!("if \"%TOOLCHAIN%\"==\"\" set \"TOOLCHAIN={}\"", dir)),
        None => {
            lines.push("if \"%TOOLCHAIN%\"==\"\" (".to_string());
            lines.push("  echo TOOLCHAIN is not set 1>&2".to_string());
            lines.push("  exit /b 1".to_string());
            lines.push(")".to_string());
        }
    }
    lines.push("set \"PATH=%TOOLCHAIN%\\bin;%PATH%\"".to_string());
    lines.push(String::new());
    lines.push(format!(
        "make -C \"%~dp0.\" CC={prefix}gcc CXX={prefix}g++ %*",
        prefix = options.toolchain_prefix
    ));
    lines.push("exit /b %ERRORLEVEL%".to_string());

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}
