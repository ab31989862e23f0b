pub(crate) const GAME_HTML: &str = r###"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Alchemy</title>
  <style>
    :root{--bg:#111827;--panel:#1f2937;--edge:#4b5563;--gold:#facc15;--muted:#9ca3af}
    *{box-sizing:border-box;margin:0;padding:0}
    html,body{width:100%;height:100%;overflow:hidden;background:var(--bg);color:#f9fafb;font-family:system-ui,sans-serif}
    .layout{display:flex;height:100%}
    #canvas{position:relative;flex:1;overflow:hidden;background:var(--panel)}
    #canvas .tile{
      position:absolute;width:60px;height:60px;border-radius:999px;border:2px solid var(--edge);
      background:rgba(55,65,81,.7);display:flex;align-items:center;justify-content:center;
      font-size:2.5rem;cursor:move;user-select:none;will-change:transform;
      transition:transform .2s ease, box-shadow .2s ease;
    }
    #canvas .tile.dragging{border:4px solid var(--gold);transition:none;z-index:10}
    #canvas .tile.target{box-shadow:0 0 0 4px rgba(250,204,21,.7)}
    #canvas .tile.pending{opacity:.5}
    #ring{position:absolute;width:64px;height:64px;border:4px solid var(--gold);border-radius:999px;pointer-events:none;display:none}
    #instructions{position:absolute;inset:0;display:flex;align-items:center;justify-content:center;color:var(--muted);pointer-events:none}
    aside{width:320px;border-left:1px solid #374151;display:flex;flex-direction:column}
    aside h2{padding:12px;color:var(--gold);border-bottom:1px solid #374151}
    #panel{flex:1;overflow-y:auto;padding:8px;display:flex;flex-direction:column;gap:8px}
    #panel .item{display:flex;align-items:center;gap:12px;padding:12px;border:1px solid var(--edge);border-radius:6px;background:#374151;cursor:grab;user-select:none}
    #panel .glyph{font-size:1.5rem;min-width:30px;text-align:center}
    #panel .name{text-transform:capitalize;font-size:.9rem}
    #ghost{position:fixed;font-size:2.25rem;pointer-events:none;z-index:50;display:none}
    #alert{position:fixed;inset:0;display:none;align-items:center;justify-content:center;background:rgba(0,0,0,.7);z-index:60}
    #alert .box{border:2px solid var(--gold);border-radius:12px;padding:24px;background:var(--panel);text-align:center}
    #alert .title{color:var(--gold);font-size:1.8rem;margin-bottom:8px}
    #status{position:absolute;left:12px;bottom:12px;color:var(--muted);font-size:.8rem;pointer-events:none}
  </style>
</head>
<body>
  <div class="layout">
    <main id="canvas">
      <div id="canvas.instructions"><div id="instructions">Drag elements here and drop one onto another to combine them.</div></div>
      <div id="ring"></div>
      <div id="status">loading elements</div>
    </main>
    <aside>
      <h2>Elements</h2>
      <div id="panel.elements"><div id="panel"></div></div>
    </aside>
  </div>
  <div id="ghost"></div>
  <div id="alert"><div class="box"><p class="title">New discovery!</p><p id="discovery.alert"></p></div></div>

  <script>
  (function(){
    const $ = (id) => document.getElementById(id);
    const canvas = $("canvas");
    const panel = $("panel");
    const ring = $("ring");
    const ghost = $("ghost");
    const alertBox = $("alert");
    const statusText = $("status");
    const tiles = new Map();
    let view = null;
    let alertTimer = null;

    async function call(path, body){
      const init = body === undefined
        ? { cache: "no-store" }
        : { method: "POST", headers: { "content-type": "application/json" }, body: JSON.stringify(body) };
      const r = await fetch(path, init);
      const update = await r.json();
      apply(update);
      return update;
    }

    function apply(update){
      for (const p of update.patches || []){
        const host = document.getElementById(p.target);
        if (!host) continue;
        const node = p.target === "panel.elements" ? panel
          : p.target === "canvas.instructions" ? $("instructions")
          : host;
        if (typeof p.html === "string"){
          if (p.swap === "append") node.insertAdjacentHTML("beforeend", p.html);
          else node.innerHTML = p.html;
        }
        if (p.target === "canvas.instructions" && p.trigger){
          node.style.display = p.trigger === "hide" ? "none" : "flex";
        }
        if (p.target === "discovery.alert" && p.trigger === "show"){
          alertBox.style.display = "flex";
          clearTimeout(alertTimer);
          alertTimer = setTimeout(() => { alertBox.style.display = "none"; }, 2000);
        }
      }
      if (update.payload) render(update.payload);
    }

    function render(v){
      view = v;
      statusText.textContent = v.status === "failed" ? "could not load elements"
        : v.status === "loading" ? "loading elements" : "";
      const seen = new Set();
      for (const inst of v.instances){
        seen.add(inst.instance_id);
        let el = tiles.get(inst.instance_id);
        if (!el){
          el = document.createElement("div");
          el.className = "tile";
          el.textContent = inst.element.emoji;
          el.title = inst.element.name;
          el.addEventListener("pointerdown", (e) => beginDrag(inst.instance_id, e));
          canvas.appendChild(el);
          tiles.set(inst.instance_id, el);
        }
        el.style.transform = `translate(${inst.x}px, ${inst.y}px)`;
        el.classList.toggle("dragging", v.dragging === inst.instance_id);
        el.classList.toggle("target", v.hover_target === inst.instance_id);
        el.classList.toggle("pending", !!inst.pending_fusion);
      }
      for (const [id, el] of tiles){
        if (!seen.has(id)){ el.remove(); tiles.delete(id); }
      }
      const target = v.hover_target && v.instances.find((i) => i.instance_id === v.hover_target);
      if (target){
        ring.style.display = "block";
        ring.style.transform = `translate(${target.x - 8}px, ${target.y - 8}px)`;
      } else {
        ring.style.display = "none";
      }
    }

    function local(e){
      const r = canvas.getBoundingClientRect();
      return { x: e.clientX - r.left, y: e.clientY - r.top };
    }

    // Canvas drag: window listeners live exactly as long as the drag. They
    // attach on pointerdown so a quick release is never missed; moves and the
    // release wait until the server has answered the begin.
    let frame = null;
    let lastMove = null;
    let beginning = null;

    function onMove(e){
      lastMove = local(e);
      if (frame !== null) return;
      frame = requestAnimationFrame(() => {
        frame = null;
        const at = lastMove;
        Promise.resolve(beginning).then(() => call("/api/drag/move", at));
      });
    }

    async function onUp(e){
      const at = local(e);
      detach();
      await beginning;
      beginning = null;
      call("/api/drag/end", at);
    }

    function detach(){
      window.removeEventListener("pointermove", onMove);
      window.removeEventListener("pointerup", onUp);
      if (frame !== null){ cancelAnimationFrame(frame); frame = null; }
    }

    function beginDrag(id, e){
      e.preventDefault();
      e.stopPropagation();
      window.addEventListener("pointermove", onMove);
      window.addEventListener("pointerup", onUp);
      beginning = call("/api/drag/begin", { instance_id: id, ...local(e) })
        .then((update) => {
          if (!(update.payload && update.payload.capture)) detach();
        })
        .catch(detach);
    }

    // Panel drag: a ghost glyph follows the pointer until release.
    let fromPanel = null;

    panel.addEventListener("pointerdown", (e) => {
      const item = e.target.closest("[data-element]");
      if (!item) return;
      e.preventDefault();
      fromPanel = item.dataset.element;
      ghost.textContent = item.querySelector(".glyph").textContent;
      moveGhost(e);
      ghost.style.display = "block";
      window.addEventListener("pointermove", moveGhost);
      window.addEventListener("pointerup", dropGhost);
    });

    function moveGhost(e){
      ghost.style.left = `${e.clientX - 24}px`;
      ghost.style.top = `${e.clientY - 24}px`;
    }

    function dropGhost(e){
      window.removeEventListener("pointermove", moveGhost);
      window.removeEventListener("pointerup", dropGhost);
      ghost.style.display = "none";
      const id = fromPanel;
      fromPanel = null;
      if (id) call("/api/panel/drop", { element_id: id, ...local(e) });
    }

    function mount(){
      const r = canvas.getBoundingClientRect();
      return call("/api/canvas/mount", { width: r.width, height: r.height });
    }

    window.addEventListener("resize", mount);
    window.addEventListener("pagehide", () => {
      detach();
      navigator.sendBeacon("/api/canvas/unmount");
    });

    // Poll until the base elements arrive (or fail to).
    async function boot(){
      await mount();
      while (!view || view.status === "loading"){
        await new Promise((res) => setTimeout(res, 500));
        await call("/api/board");
      }
    }
    boot();
  })();
  </script>
</body>
</html>
"###;
