//! Reusable source contents

pub const PAGE_WITH_LAYOUT: &str = r#"---
title: About
$render: _layout.html
---
# About us
"#;

pub const LAYOUT: &str = "<html><title>{{ title }}</title><body>{{ yield }}</body></html>";

pub const NAV: &str = "<nav>{{ @include _links.html }}</nav>";

pub const LINKS: &str = "<a href=\"/\">home</a>";

pub const INDEX_WITH_NAV: &str = "<main>{{ @include _nav.html }}</main>";

pub const LITERATE_COFFEE: &str = r#"# App

Boot sequence.

    square = (x) -> x * x

Done.
"#;

pub const BROKEN_FRONTMATTER: &str = "---\ntitle: [unclosed\n---\nbody\n";
