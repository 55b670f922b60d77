use std::{io,fs};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::json;

use super::error::Result;
use super::metrics::GraphingData;


// One chart comparing the same graph kind across several regions. Only
// finite points are plotted; degenerate transforms leave gaps instead.
pub fn comparison_graph(graph_path: &Path, filename: &str,
			plots: &Vec<GraphingData>) -> Result<()> {

    let (title,xtitle,ytitle) = match plots.first() {
	Some(plot) => (plot.chart_name.as_str(),
		       plot.x_axis_name.as_str(),
		       plot.y_axis_name.as_str()),
	None => return Ok(()),
    };

    let temporal = xtitle == "Date";

    let x_encoding = match temporal {
	true => json!({"field":"Label","timeUnit":"utcyearmonthdate","title":xtitle,"type":"temporal"}),
	false => json!({"field":"Label","title":xtitle,"type":"quantitative"}),
    };

    fs::create_dir_all(graph_path)?;
    let mut out = io::BufWriter::new(File::create(graph_path.join(filename))?);

    write!(out, "<!DOCTYPE html><html><head>")?;
    write!(out, "<meta charset=\"UTF-8\">")?;
    write!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
    write!(out, "<title>{}</title>", title)?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega@5\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-lite@4\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-embed\"></script>")?;
    write!(out, "</head>")?;
    write!(out, "<body>")?;
    write!(out, "<div id=\"vis\" style=\"overflow: hidden; position: absolute;top: 0; left: 0; right: 0; bottom: 0;\"></div>")?;
    write!(out, "<script type=\"text/javascript\">")?;
    write!(out, "var spec = ")?;

    serde_json::to_writer_pretty(out.by_ref(), &json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"data": {
	    "values": plots.iter().flat_map(
		|plot| plot.x_axis_labels.iter().zip(plot.y_axis_data.iter()).filter_map(
		    move |(label,value)| match value.is_finite() {
			false => None,
			true => Some(match temporal {
			    true => json!({
				"Label": label,
				"Region": plot.name,
				"Value": value
			    }),
			    false => json!({
				"Label": label.parse::<u64>().unwrap_or(0),
				"Region": plot.name,
				"Value": value
			    })
			})
		    })
	    ).collect::<Vec<_>>()
	},
	"layer": [
	    {
		"encoding": {
		    "color": {
			"field": "Region",
			"type":"nominal"
		    },
		    "x": x_encoding,
		    "y": {
			"field":"Value",
			"title": ytitle,
			"type":"quantitative"
		    }
		},
		"layer": [
		    {
			"mark":"line",
			"selection": {
			    "Highlight": {"bind":"legend","type":"multi","fields":["Region"]},
			    "Grid": {"bind":"scales","type":"interval"}
			},
			"encoding":{
			    "opacity":{"value":0.1,"condition":{"value":1,"selection":"Highlight"}}
			}
		    },
		    {
			"mark":"point",
			"encoding": {
			    "opacity": {
				"value":0,
				"condition": [
				    {"value":1,"test":{"and":[{"selection":"Highlight"},{"selection":"Hover"}]}},
				    {"value":0.2,"selection":"Hover"}
				]
			    }
			}
		    }
		]
	    },
	    {
		"transform": [
		    {
			"groupby": ["Label"],
			"value": "Value",
			"pivot": "Region"
		    }
		],
		"mark": {
		    "color": "gray",
		    "tooltip": {"content":"data"},
		    "type": "rule"
		},
		"selection": {
		    "Hover": {
			"nearest":true,
			"empty":"none",
			"clear":"mouseout",
			"type":"single",
			"on":"mouseover",
			"fields":["Label"]
		    }
		},
		"encoding": {
		    "opacity": {
			"value": 0,
			"condition": {
			    "value": 1,
			    "selection": "Hover"
			}
		    },
		    "x": x_encoding,
		    "tooltip": vec![
			x_encoding.clone()
		    ].into_iter().chain(plots.iter().map(
			|plot| json!({"field":plot.name,"format":".3f","type":"quantitative"})
		    )).collect::<Vec<_>>()
		}
	    }
	]
    }))?;

    write!(out, ";vegaEmbed('#vis', spec,{{}}).then(function(result) {{")?;
    write!(out, "}}).catch(console.error);")?;
    write!(out, "</script>")?;
    write!(out, "</body></html>")?;

    Ok(())

}
