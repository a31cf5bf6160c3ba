//! Starter files seeded under a new project's root folder. One template
//! per supported framework; only React ships today.

pub struct TemplateFile {
    pub name: &'static str,
    pub content: &'static str,
    pub language: &'static str,
}

pub const SUPPORTED_FRAMEWORKS: &[&str] = &["react"];

const REACT_APP_JSX: &str = r#"import React from 'react';
import './App.css';

function App() {
  return (
    <div className="App">
      <header className="App-header">
        <h1>Welcome to CipherStudio</h1>
        <p>Start building your amazing react application!</p>
      </header>
    </div>
  );
}

export default App;
"#;

const REACT_APP_CSS: &str = r#".App {
  text-align: center;
}

.App-header {
  background-color: #282c34;
  padding: 20px;
  color: white;
  min-height: 50vh;
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
}

h1 {
  margin: 0 0 1rem 0;
}

p {
  font-size: 1.2rem;
}
"#;

const REACT_INDEX_JS: &str = r#"import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App';

const root = ReactDOM.createRoot(document.getElementById('root'));
root.render(<App />);
"#;

const REACT_TEMPLATE: &[TemplateFile] = &[
    TemplateFile {
        name: "App.jsx",
        content: REACT_APP_JSX,
        language: "jsx",
    },
    TemplateFile {
        name: "App.css",
        content: REACT_APP_CSS,
        language: "css",
    },
    TemplateFile {
        name: "index.js",
        content: REACT_INDEX_JS,
        language: "javascript",
    },
];

/// Unknown frameworks fall back to the React template; the boundary
/// rejects them before we get here.
pub fn template_files(framework: &str) -> &'static [TemplateFile] {
    match framework {
        "react" => REACT_TEMPLATE,
        _ => REACT_TEMPLATE,
    }
}
