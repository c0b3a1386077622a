use axum::extract::Path;
use axum::response::Html;

pub async fn landing() -> Html<String> {
    Html(layout(
        "Convene",
        r#"<h1>Convene</h1>
<form id="join" onsubmit="location.href = '/room/' + encodeURIComponent(this.elements.roomId.value) + '?name=' + encodeURIComponent(this.elements.displayName.value); return false;">
  <input name="roomId" placeholder="Room" required>
  <input name="displayName" placeholder="Your name" required>
  <button type="submit">Join</button>
</form>"#,
    ))
}

pub async fn room(Path(room_id): Path<String>) -> Html<String> {
    let room_id = escape_html(&room_id);
    let body = format!(
        r#"<main id="room" data-room-id="{room_id}">
  <h1>Room {room_id}</h1>
  <video id="localVideo" autoplay playsinline muted></video>
  <div id="videosContainer"></div>
  <aside><span id="participantCount">0</span><div id="participantList"></div></aside>
  <nav><button id="muteBtn">mic</button><button id="videoBtn">cam</button><button id="leaveBtn">leave</button></nav>
</main>
<script src="/js/room.js"></script>"#
    );
    Html(layout(&format!("Convene - {room_id}"), &body))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title>\
         <link rel=\"stylesheet\" href=\"/css/style.css\"></head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
