//! Built-in content: default editor document, templates, snippets, examples and
//! the challenge set. These guarantee a useful app without any TOML config.

use crate::domain::{Challenge, Difficulty, HtmlExample, Snippet, Template};

/// Document loaded into a fresh practice session when no example is requested.
pub const DEFAULT_CODE: &str = r##"<!DOCTYPE html>
<html>
<head>
  <title>My HTML Page</title>
  <style>
    body {
      font-family: Arial, sans-serif;
      line-height: 1.6;
      margin: 0;
      padding: 20px;
      background-color: #f5f5f5;
    }
    .container {
      max-width: 800px;
      margin: 0 auto;
      background-color: white;
      padding: 20px;
      border-radius: 5px;
    }
  </style>
</head>
<body>
  <div class="container">
    <h1>Welcome to My HTML Page</h1>
    <p>This is a paragraph of text. You can edit this code in the editor.</p>
    <ul>
      <li>List item 1</li>
      <li>List item 2</li>
      <li>List item 3</li>
    </ul>
    <button>Click Me</button>
  </div>
</body>
</html>"##;

pub fn templates() -> Vec<Template> {
  vec![
    Template {
      id: "basic",
      name: "Basic HTML",
      description: Some("A simple HTML boilerplate with minimal styling"),
      code: r##"<!DOCTYPE html>
<html>
<head>
  <title>Basic HTML Page</title>
  <style>
    body {
      font-family: Arial, sans-serif;
      line-height: 1.6;
      margin: 0;
      padding: 20px;
    }
  </style>
</head>
<body>
  <h1>Hello World</h1>
  <p>This is a basic HTML page.</p>
</body>
</html>"##,
    },
    Template {
      id: "responsive",
      name: "Responsive Layout",
      description: Some("A responsive layout with CSS flexbox"),
      code: r##"<!DOCTYPE html>
<html>
<head>
  <title>Responsive Layout</title>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    .row { display: flex; flex-wrap: wrap; }
    .col { flex: 1 1 250px; padding: 20px; }
    header, footer { background: #333; color: white; padding: 20px; text-align: center; }
  </style>
</head>
<body>
  <header>
    <h1>Responsive Layout</h1>
  </header>
  <div class="row">
    <div class="col"><h2>Column 1</h2><p>Content for the first column.</p></div>
    <div class="col"><h2>Column 2</h2><p>Content for the second column.</p></div>
    <div class="col"><h2>Column 3</h2><p>Content for the third column.</p></div>
  </div>
  <footer>
    <p>Footer</p>
  </footer>
</body>
</html>"##,
    },
    Template {
      id: "form",
      name: "Contact Form",
      description: Some("HTML form with validation and styling"),
      code: r##"<!DOCTYPE html>
<html>
<head>
  <title>Contact Form</title>
  <style>
    form { max-width: 500px; margin: 0 auto; }
    label { display: block; margin-top: 10px; }
    input, textarea { width: 100%; padding: 8px; }
  </style>
</head>
<body>
  <form>
    <label for="name">Name</label>
    <input type="text" id="name" name="name" required>
    <label for="email">Email</label>
    <input type="email" id="email" name="email" required>
    <label for="message">Message</label>
    <textarea id="message" name="message" rows="5" required></textarea>
    <button type="submit">Send</button>
  </form>
</body>
</html>"##,
    },
    Template {
      id: "gallery",
      name: "Image Gallery",
      description: Some("Responsive image gallery with CSS grid"),
      code: r##"<!DOCTYPE html>
<html>
<head>
  <title>Image Gallery</title>
  <style>
    .gallery {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(250px, 1fr));
      gap: 20px;
    }
    figure { margin: 0; }
    img { width: 100%; height: auto; }
  </style>
</head>
<body>
  <div class="gallery">
    <figure>
      <img src="https://via.placeholder.com/400x300" alt="Image 1">
      <figcaption>Image 1</figcaption>
    </figure>
    <figure>
      <img src="https://via.placeholder.com/400x300" alt="Image 2">
      <figcaption>Image 2</figcaption>
    </figure>
  </div>
</body>
</html>"##,
    },
    Template {
      id: "navbar",
      name: "Responsive Navigation",
      description: Some("Mobile-friendly navigation bar with hamburger menu"),
      code: r##"<!DOCTYPE html>
<html>
<head>
  <title>Responsive Navigation</title>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    nav { background: #333; }
    nav ul { list-style: none; display: flex; margin: 0; padding: 0; }
    nav a { color: white; display: block; padding: 14px 20px; text-decoration: none; }
    .toggle { display: none; }
    @media (max-width: 600px) {
      nav ul { display: none; flex-direction: column; }
      nav ul.open { display: flex; }
      .toggle { display: block; }
    }
  </style>
</head>
<body>
  <nav>
    <button class="toggle" onclick="document.querySelector('nav ul').classList.toggle('open')">Menu</button>
    <ul>
      <li><a href="#home">Home</a></li>
      <li><a href="#about">About</a></li>
      <li><a href="#contact">Contact</a></li>
    </ul>
  </nav>
  <p>This is a responsive navigation bar with a hamburger menu for mobile devices.</p>
</body>
</html>"##,
    },
  ]
}

pub fn snippets() -> Vec<Snippet> {
  vec![
    Snippet {
      id: "basic-html",
      name: "Basic HTML Structure",
      code: r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Document Title</title>
</head>
<body>
  <!-- Content goes here -->
</body>
</html>"##,
    },
    Snippet {
      id: "meta-tags",
      name: "Meta Tags",
      code: r##"<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta name="description" content="Description of your page">
<meta name="keywords" content="keywords, for, search, engines">
<meta name="author" content="Your Name">"##,
    },
    Snippet {
      id: "css-styles",
      name: "CSS Styles",
      code: r##"<style>
  body {
    font-family: Arial, sans-serif;
    line-height: 1.6;
    margin: 0;
    padding: 20px;
  }
  h1 {
    color: #333;
  }
</style>"##,
    },
    Snippet {
      id: "script-tag",
      name: "JavaScript",
      code: r##"<script>
  document.addEventListener('DOMContentLoaded', function() {
    console.log('Page loaded');
  });
</script>"##,
    },
    Snippet {
      id: "responsive-img",
      name: "Responsive Image",
      code: r##"<img src="image.jpg" alt="Description of the image" style="max-width: 100%; height: auto;">"##,
    },
    Snippet {
      id: "table",
      name: "Table",
      code: r##"<table border="1">
  <thead>
    <tr>
      <th>Header 1</th>
      <th>Header 2</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <td>Row 1, Cell 1</td>
      <td>Row 1, Cell 2</td>
    </tr>
  </tbody>
</table>"##,
    },
    Snippet {
      id: "form",
      name: "Form",
      code: r##"<form action="/submit-form" method="post">
  <div>
    <label for="name">Name:</label>
    <input type="text" id="name" name="name" required>
  </div>
  <div>
    <label for="email">Email:</label>
    <input type="email" id="email" name="email" required>
  </div>
  <button type="submit">Submit</button>
</form>"##,
    },
    Snippet {
      id: "flexbox",
      name: "Flexbox Container",
      code: r##"<div style="display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap;">
  <div style="flex: 1 1 300px; margin: 10px; padding: 20px; background: #f4f4f4;">Item 1</div>
  <div style="flex: 1 1 300px; margin: 10px; padding: 20px; background: #f4f4f4;">Item 2</div>
</div>"##,
    },
    Snippet {
      id: "grid",
      name: "CSS Grid",
      code: r##"<div style="display: grid; grid-template-columns: repeat(auto-fill, minmax(250px, 1fr)); gap: 20px;">
  <div style="padding: 20px; background: #f4f4f4;">Grid Item 1</div>
  <div style="padding: 20px; background: #f4f4f4;">Grid Item 2</div>
</div>"##,
    },
  ]
}

#[allow(clippy::too_many_arguments)]
fn challenge(
  id: &str,
  title: &str,
  description: &str,
  difficulty: Difficulty,
  time_limit_seconds: u32,
  required: &[&str],
  hint: &str,
  starting_code: &str,
) -> Challenge {
  Challenge {
    id: id.into(),
    title: title.into(),
    description: description.into(),
    difficulty,
    time_limit_seconds,
    starting_code: starting_code.into(),
    required_substrings: required.iter().map(|s| s.to_string()).collect(),
    hint: hint.into(),
  }
}

/// Built-in timed challenges.
pub fn seed_challenges() -> Vec<Challenge> {
  vec![
    challenge(
      "1",
      "Basic HTML Structure",
      "Create a valid HTML document with proper structure including html, head, and body tags.",
      Difficulty::Beginner,
      300,
      &["<html", "<head", "<body"],
      "Remember that every HTML document needs the basic structure tags!",
      "<!-- Start your HTML document here -->",
    ),
    challenge(
      "2",
      "Navigation Menu",
      "Create a navigation menu with at least 4 items using the nav and ul/li elements.",
      Difficulty::Intermediate,
      420,
      &["<nav", "<ul", "<li", "</nav>"],
      "The nav element should contain an unordered list (ul) with list items (li).",
      "<!-- Create your navigation menu here -->",
    ),
    challenge(
      "3",
      "Form Creation",
      "Create a form with inputs for name, email, and a submit button.",
      Difficulty::Intermediate,
      480,
      &["<form", "type=\"text\"", "type=\"email\"", "type=\"submit\"", "</form>"],
      "Forms need the form tag and various input types for different kinds of data.",
      "<!-- Create your form here -->",
    ),
    challenge(
      "4",
      "Semantic Article",
      "Create a semantic article with header, section, and footer elements.",
      Difficulty::Advanced,
      540,
      &["<article", "<header", "<section", "<footer", "</article>"],
      "Semantic elements help describe the meaning of the content they contain.",
      "<!-- Create your semantic article here -->",
    ),
    challenge(
      "5",
      "Responsive Image Gallery",
      "Create a responsive image gallery with figure and figcaption elements.",
      Difficulty::Advanced,
      600,
      &["<figure", "<img", "<figcaption", "</figure>"],
      "The figure element represents self-contained content, while figcaption provides a caption.",
      "<!-- Create your image gallery here -->",
    ),
  ]
}

fn example(id: u64, title: &str, description: &str, category: &str, level: &str, code: &str) -> HtmlExample {
  HtmlExample {
    id,
    title: title.into(),
    description: description.into(),
    category: category.into(),
    code: code.into(),
    level: level.into(),
  }
}

/// Built-in example catalog.
pub fn seed_examples() -> Vec<HtmlExample> {
  vec![
    example(
      1,
      "HTML Basic Structure",
      "Learn the basic structure of an HTML document and understand the purpose of each element.",
      "structure",
      "beginner",
      r##"<!DOCTYPE html>
<html>
<head>
  <title>Page Title</title>
</head>
<body>
  <h1>This is a Heading</h1>
  <p>This is a paragraph.</p>
</body>
</html>"##,
    ),
    example(
      2,
      "Text Formatting",
      "Explore various text formatting tags to style your content and improve readability.",
      "text",
      "beginner",
      r##"<p>This is <b>bold</b> text.</p>
<p>This is <strong>important</strong> text.</p>
<p>This is <i>italic</i> text.</p>
<p>This is <em>emphasized</em> text.</p>
<p>This is <mark>highlighted</mark> text.</p>
<p>This is <small>smaller</small> text.</p>
<p>This is <del>deleted</del> text.</p>
<p>This is <ins>inserted</ins> text.</p>
<p>This is <sub>subscript</sub> and <sup>superscript</sup> text.</p>"##,
    ),
    example(
      3,
      "HTML Forms",
      "Create interactive forms to collect user data with various input types and controls.",
      "forms",
      "intermediate",
      r##"<form action="/submit" method="post">
  <div>
    <label for="name">Name:</label>
    <input type="text" id="name" name="name" required>
  </div>
  <div>
    <label for="email">Email:</label>
    <input type="email" id="email" name="email" required>
  </div>
  <div>
    <label for="country">Country:</label>
    <select id="country" name="country">
      <option value="usa">USA</option>
      <option value="canada">Canada</option>
      <option value="uk">UK</option>
    </select>
  </div>
  <button type="submit">Submit</button>
</form>"##,
    ),
    example(
      4,
      "HTML Lists",
      "Learn how to create ordered, unordered, and definition lists to organize your content.",
      "lists",
      "beginner",
      r##"<h3>Shopping List</h3>
<ul>
  <li>Milk</li>
  <li>Bread</li>
  <li>Eggs</li>
</ul>

<h3>Recipe Instructions</h3>
<ol>
  <li>Preheat the oven to 350°F</li>
  <li>Mix all ingredients in a bowl</li>
  <li>Bake for 30 minutes</li>
</ol>

<h3>HTML Terms</h3>
<dl>
  <dt>HTML</dt>
  <dd>HyperText Markup Language</dd>
  <dt>Tag</dt>
  <dd>A markup element that defines structure and content</dd>
</dl>"##,
    ),
    example(
      5,
      "HTML Tables",
      "Create structured tables to display tabular data with headers, rows, and columns.",
      "tables",
      "intermediate",
      r##"<table border="1">
  <caption>Monthly Savings</caption>
  <thead>
    <tr>
      <th>Month</th>
      <th>Savings</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <td>January</td>
      <td>$1500</td>
    </tr>
    <tr>
      <td>February</td>
      <td>$1400</td>
    </tr>
  </tbody>
</table>"##,
    ),
    example(
      6,
      "Links and Images",
      "Learn how to add links to other pages and display images in your HTML documents.",
      "links",
      "beginner",
      r##"<p>Visit <a href="https://www.example.com">Example.com</a> for more information.</p>
<p>Contact us at <a href="mailto:info@example.com">info@example.com</a>.</p>
<figure>
  <img src="https://via.placeholder.com/400x300" alt="Landscape">
  <figcaption>Beautiful landscape image</figcaption>
</figure>"##,
    ),
    example(
      7,
      "Semantic HTML",
      "Use semantic elements to give meaning to your page structure and improve accessibility.",
      "semantic",
      "intermediate",
      r##"<header>
  <h1>My Website</h1>
  <nav>
    <ul>
      <li><a href="#home">Home</a></li>
      <li><a href="#about">About</a></li>
    </ul>
  </nav>
</header>
<main>
  <section id="about">
    <h2>About Us</h2>
    <p>We are a company that specializes in web development.</p>
  </section>
  <aside>
    <h3>Latest News</h3>
    <p>We've just launched our new service!</p>
  </aside>
</main>
<footer>
  <p>&copy; 2023 My Website. All rights reserved.</p>
</footer>"##,
    ),
    example(
      8,
      "HTML Meta Tags",
      "Learn how to use meta tags to provide metadata about your HTML document.",
      "structure",
      "intermediate",
      r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="description" content="This is an example page demonstrating HTML meta tags">
  <meta property="og:title" content="HTML Meta Tags Example">
  <title>Meta Tags Example</title>
</head>
<body>
  <h1>Meta Tags</h1>
</body>
</html>"##,
    ),
    example(
      9,
      "HTML Audio and Video",
      "Embed audio and video content in your pages with native HTML elements.",
      "links",
      "intermediate",
      r##"<video width="320" height="240" controls>
  <source src="movie.mp4" type="video/mp4">
  Your browser does not support the video tag.
</video>

<audio controls>
  <source src="audio.mp3" type="audio/mpeg">
  Your browser does not support the audio element.
</audio>"##,
    ),
  ]
}
