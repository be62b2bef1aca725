pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>siglocate</title>
<style>
  body { font-family: system-ui, sans-serif; display: flex; flex-direction: column;
         align-items: center; justify-content: center; min-height: 100vh; margin: 0; gap: 12px; }
  #status { white-space: pre-line; text-align: center; min-height: 6em; }
  button { min-width: 14em; padding: 0.6em 1em; }
</style>
</head>
<body>
  <div id="status"></div>
  <button data-source="fused">GPSから位置取得</button>
  <button data-source="wifi">Wi-Fiから位置取得</button>
  <button data-source="cell">Cellから位置取得</button>
<script>
  const status = document.getElementById("status");
  async function refresh() {
    const res = await fetch("/api/status");
    if (res.ok) status.textContent = (await res.json()).text;
  }
  document.querySelectorAll("button").forEach((b) => {
    b.addEventListener("click", async () => {
      await fetch("/api/locate/" + b.dataset.source, { method: "POST" });
      refresh();
    });
  });
  refresh();
  setInterval(refresh, 500);
</script>
</body>
</html>
"#;
