use crate::persona::Persona;
use crate::web::avatar::USER_AVATAR;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{{TITLE}}</title>
    <style>
      body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 0 auto; padding: 1rem; }
      #log { display: flex; flex-direction: column; gap: 0.75rem; margin: 1rem 0 6rem; }
      .turn { display: flex; gap: 0.75rem; align-items: flex-start; }
      .avatar { width: 2.25rem; height: 2.25rem; border-radius: 50%; flex: none; text-align: center; font-size: 1.6rem; object-fit: cover; }
      .text { white-space: pre-wrap; padding-top: 0.4rem; }
      .error { color: #b00020; white-space: pre-wrap; }
      .info { color: #555; }
      form { display: flex; gap: 0.5rem; }
      #chat-form { position: fixed; bottom: 1rem; left: 0; right: 0; max-width: 46rem; margin: 0 auto; padding: 0 1rem; }
      input { flex: 1; padding: 0.6rem; font-size: 1rem; }
      [hidden] { display: none !important; }
    </style>
  </head>
  <body>
    <h1>✨ {{TITLE}}</h1>
    <p>{{GREETING}}</p>
    <div id="key-panel" hidden>
      <p class="info">Please provide your Google API Key to chat with Aurora.</p>
      <form id="key-form">
        <input id="key" type="password" autocomplete="off" placeholder="Enter your Google API Key:" />
        <button type="submit">Save</button>
      </form>
      <p class="info">Get your key from https://aistudio.google.com/app/apikey</p>
    </div>
    <div id="log"></div>
    <form id="chat-form">
      <input id="message" autocomplete="off" placeholder="What's on your mind?" />
    </form>
    <script>
      const log = document.getElementById("log");
      const keyPanel = document.getElementById("key-panel");
      const chatForm = document.getElementById("chat-form");
      const message = document.getElementById("message");

      function turn(role, text) {
        const row = document.createElement("div");
        row.className = "turn " + role;
        let avatar;
        if (role === "assistant") {
          avatar = document.createElement("img");
          avatar.src = "/avatar";
          avatar.alt = "";
        } else {
          avatar = document.createElement("span");
          avatar.textContent = "{{USER_AVATAR}}";
        }
        avatar.className = "avatar";
        const body = document.createElement("div");
        body.className = "text";
        body.textContent = text;
        row.append(avatar, body);
        log.append(row);
        window.scrollTo(0, document.body.scrollHeight);
        return body;
      }

      function showError(text) {
        const p = document.createElement("p");
        p.className = "error";
        p.textContent = text;
        log.append(p);
      }

      function needCredential(needed) {
        keyPanel.hidden = !needed;
        chatForm.hidden = needed;
      }

      async function loadSession() {
        const response = await fetch("/api/session");
        const session = await response.json();
        for (const t of session.history) {
          turn(t.role, t.text);
        }
        needCredential(session.needs_credential);
      }

      document.getElementById("key-form").addEventListener("submit", async (event) => {
        event.preventDefault();
        const key = document.getElementById("key").value;
        const response = await fetch("/api/credential", {
          method: "POST",
          headers: { "Content-Type": "application/json" },
          body: JSON.stringify({ key }),
        });
        if (response.ok) {
          needCredential(false);
        } else {
          showError((await response.json()).error);
        }
      });

      chatForm.addEventListener("submit", async (event) => {
        event.preventDefault();
        const text = message.value;
        if (!text.trim()) {
          return;
        }
        message.value = "";
        message.disabled = true;
        try {
          await send(text);
        } finally {
          message.disabled = false;
          message.focus();
        }
      });

      async function send(text) {
        turn("user", text);
        const response = await fetch("/api/chat", {
          method: "POST",
          headers: { "Content-Type": "application/json" },
          body: JSON.stringify({ message: text }),
        });
        if (response.status === 204) {
          return;
        }
        if (!response.ok) {
          showError((await response.json()).error);
          if (response.status === 401) {
            needCredential(true);
          }
          return;
        }
        const reply = turn("assistant", "");
        const reader = response.body.getReader();
        const decoder = new TextDecoder();
        let buffer = "";
        for (;;) {
          const { value, done } = await reader.read();
          if (done) {
            break;
          }
          buffer += decoder.decode(value, { stream: true }).replace(/\r/g, "");
          let end;
          while ((end = buffer.indexOf("\n\n")) >= 0) {
            const frame = buffer.slice(0, end);
            buffer = buffer.slice(end + 2);
            let name = "message";
            let data = "";
            for (const line of frame.split("\n")) {
              if (line.startsWith("event:")) {
                name = line.slice(6).trim();
              } else if (line.startsWith("data:")) {
                data += line.slice(5).trim();
              }
            }
            if (name === "fragment") {
              reply.textContent += JSON.parse(data).text;
              window.scrollTo(0, document.body.scrollHeight);
            } else if (name === "error") {
              if (!reply.textContent) {
                reply.parentElement.remove();
              }
              const failure = JSON.parse(data);
              showError(failure.message);
              if (failure.kind === "invalid_credential") {
                needCredential(true);
              }
            }
          }
        }
      }

      loadSession();
    </script>
  </body>
</html>
"#;

/// The single chat page.
pub fn render(persona: &Persona) -> String {
    TEMPLATE
        .replace("{{TITLE}}", &escape(&persona.title()))
        .replace("{{GREETING}}", &escape(persona.greeting()))
        .replace("{{USER_AVATAR}}", USER_AVATAR)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
