// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Prompt Template Registry
//!
//! Maps a generation mode to a system/user prompt pair and renders the user
//! template with Handlebars. Strict mode is off, so rendering never fails on
//! a missing placeholder: absent context values substitute an empty string
//! (`"normal"` for `style`), and `keywords` accepts either an array (joined
//! with `、`) or a scalar.

use handlebars::Handlebars;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;

pub struct PromptTemplate {
    pub system: Option<&'static str>,
    pub user: &'static str,
}

pub struct TemplateRegistry {
    templates: HashMap<&'static str, PromptTemplate>,
    handlebars: Handlebars<'static>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Output is a prompt, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);

        Self {
            templates: template_table(),
            handlebars,
        }
    }

    pub fn get(&self, mode: &str) -> Option<&PromptTemplate> {
        self.templates.get(mode)
    }

    /// Render a template's user prompt against caller-supplied context.
    pub fn render_user(&self, template: &PromptTemplate, context: &Map<String, Value>) -> String {
        let vars = template_vars(context);
        match self.handlebars.render_template(template.user, &vars) {
            Ok(prompt) => prompt,
            Err(e) => {
                // Templates are static and valid; this only trips if one is
                // edited into invalid syntax.
                warn!(error = %e, "template rendering failed, using raw template");
                template.user.to_string()
            }
        }
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn template_vars(context: &Map<String, Value>) -> Value {
    let text = |key: &str| {
        context
            .get(key)
            .map(value_to_string)
            .unwrap_or_default()
    };
    json!({
        "previous_text": text("previous_text"),
        "target_text": text("target_text"),
        "style": context
            .get("style")
            .map(value_to_string)
            .unwrap_or_else(|| "normal".to_string()),
        "keywords": keywords_to_string(context.get("keywords")),
        "novel_title": text("novel_title"),
        "novel_summary": text("novel_summary"),
        "character_summary": text("character_summary"),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn keywords_to_string(keywords: Option<&Value>) -> String {
    match keywords {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join("、"),
        Some(value) => value_to_string(value),
        None => String::new(),
    }
}

fn template_table() -> HashMap<&'static str, PromptTemplate> {
    HashMap::from([
        (
            "continue",
            PromptTemplate {
                system: Some("你是一个专业的小说家。根据给出的前文续写故事，保持风格一致，逻辑通顺。"),
                user: "【小说信息】\n标题：{{novel_title}}\n简介：{{novel_summary}}\n\n【人物档案】\n{{character_summary}}\n\n【前文】\n{{previous_text}}\n\n【续写要求】\n接着写一段，风格倾向为{{style}}。不要重复前文。",
            },
        ),
        (
            "rewrite",
            PromptTemplate {
                system: Some("你是一个资深文学编辑，擅长改写与增强表现力。"),
                user: "请在不改变核心情节的前提下重写以下文本，使其更生动、更具体：\n\n{{target_text}}\n",
            },
        ),
        (
            "polish",
            PromptTemplate {
                system: Some("你是一个资深文学编辑，擅长润色与修辞优化。"),
                user: "请润色以下文本，提升语言流畅度与节奏，同时保持原意：\n\n{{target_text}}\n",
            },
        ),
        (
            "outline",
            PromptTemplate {
                system: Some("你是一个经验丰富的编剧与策划，擅长结构化故事。"),
                user: "关键词：{{keywords}}\n\n请生成一个三幕式故事大纲，包含每幕关键情节与转折点。",
            },
        ),
        (
            "character",
            PromptTemplate {
                system: Some("你是一个人物设定专家。"),
                user: "【小说信息】\n标题：{{novel_title}}\n简介：{{novel_summary}}\n\n请根据关键词：{{keywords}}，生成一个详细的人物档案（姓名、外貌、性格、动机、弱点、成长线、口头禅）。",
            },
        ),
        (
            "plot_twist",
            PromptTemplate {
                system: Some("你是一个擅长制造悬念和反转的编剧。"),
                user: "【小说信息】\n标题：{{novel_title}}\n简介：{{novel_summary}}\n\n关键词：{{keywords}}\n\n请根据上述信息，设计3个令人意想不到的情节转折或冲突升级方案。",
            },
        ),
        (
            "story_fragment",
            PromptTemplate {
                system: Some("你是一个极具画面感的创意写作助手。"),
                user: "【小说信息】\n标题：{{novel_title}}\n简介：{{novel_summary}}\n\n关键词：{{keywords}}\n\n请根据关键词写一个精彩的故事片段（约300-500字），注重场景描写和氛围渲染。",
            },
        ),
        (
            "world_building",
            PromptTemplate {
                system: Some("你是一个世界观架构师。"),
                user: "【小说信息】\n标题：{{novel_title}}\n简介：{{novel_summary}}\n\n关键词：{{keywords}}\n\n请设计一个独特的世界观设定（地理环境、社会制度、力量体系或特殊规则）。",
            },
        ),
        (
            "mimic",
            PromptTemplate {
                system: Some("你是一个擅长模仿各种写作风格的文学大师。"),
                user: "请将以下这段文本改写，严格模仿【{{style}}】的写作风格和语感。\n\n【原文本】\n{{target_text}}\n\n【改写后】",
            },
        ),
    ])
}
